//! Link deduplication and include/exclude keyword policy.

use std::collections::HashSet;

use crate::types::Article;

/// Deduplicates by link (first occurrence wins) and applies keyword policy to
/// titles, preserving input order.
///
/// An article is kept when `include` is empty or its lower-cased title
/// contains at least one include term, and it contains no exclude term.
/// Exclusion always wins. Terms are lower-cased but not trimmed, so
/// surrounding spaces take part in the match. Empty terms are ignored.
#[must_use]
pub fn filter_articles(
    articles: &[Article],
    include: &[String],
    exclude: &[String],
) -> Vec<Article> {
    let include = normalize_terms(include);
    let exclude = normalize_terms(exclude);
    let mut seen: HashSet<&str> = HashSet::new();

    articles
        .iter()
        .filter(|&article| seen.insert(article.link.as_str()))
        .filter(|article| {
            let title = article.title.to_lowercase();
            let included = include.is_empty() || include.iter().any(|t| title.contains(t.as_str()));
            included && !exclude.iter().any(|t| title.contains(t.as_str()))
        })
        .cloned()
        .collect()
}

fn normalize_terms(terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .map(|t| t.to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gmir_core::Region;

    fn article(title: &str, link: &str) -> Article {
        Article {
            title: title.to_string(),
            link: link.to_string(),
            source_name: "src".to_string(),
            region: Region::Kr,
        }
    }

    fn terms(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let input = vec![
            article("First Maps story", "https://e.com/1"),
            article("Duplicate link, different title", "https://e.com/1"),
            article("Second Maps story", "https://e.com/2"),
        ];
        let out = filter_articles(&input, &[], &[]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "First Maps story");
        assert_eq!(out[1].link, "https://e.com/2");
    }

    #[test]
    fn include_is_case_insensitive_substring() {
        let input = vec![
            article("GOOGLE MAPS update", "https://e.com/1"),
            article("Weather today", "https://e.com/2"),
            article("Roadmaps for 2026", "https://e.com/3"),
        ];
        let out = filter_articles(&input, &terms(&["maps"]), &[]);
        let titles: Vec<&str> = out.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["GOOGLE MAPS update", "Roadmaps for 2026"]);
    }

    #[test]
    fn exclude_beats_include() {
        let input = vec![
            article("Maps and Waze merge", "https://e.com/1"),
            article("Maps only", "https://e.com/2"),
        ];
        let out = filter_articles(&input, &terms(&["maps"]), &terms(&["WAZE"]));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Maps only");
    }

    #[test]
    fn empty_include_keeps_everything_not_excluded() {
        let input = vec![
            article("Anything", "https://e.com/1"),
            article("Sponsored post", "https://e.com/2"),
        ];
        let out = filter_articles(&input, &terms(&[""]), &terms(&["sponsored"]));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Anything");
    }

    #[test]
    fn spaced_term_keeps_its_spaces() {
        let input = vec![
            article("Google Maps roadmap", "https://e.com/1"),
            article("New ad formats in Maps", "https://e.com/2"),
        ];
        let out = filter_articles(&input, &[], &terms(&[" ad "]));
        let titles: Vec<&str> = out.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Google Maps roadmap"]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let input = vec![
            article("Maps A", "https://e.com/1"),
            article("Maps A again", "https://e.com/1"),
            article("Other", "https://e.com/2"),
            article("Maps B ad", "https://e.com/3"),
        ];
        let include = terms(&["maps"]);
        let exclude = terms(&["ad"]);
        let once = filter_articles(&input, &include, &exclude);
        let twice = filter_articles(&once, &include, &exclude);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 1);
    }
}

//! Prompt construction for the structuring call.

use std::fmt::Write;

use crate::types::Article;

/// Articles beyond this many (in filter order) are not sent to the model.
pub const MAX_PROMPT_ARTICLES: usize = 20;

pub const SYSTEM_PROMPT: &str = r#"You are a Google Maps & local-search intelligence analyst. Given a list of news articles, produce a JSON array of report items. Each item:
{
  "title_en": "English title",
  "title_ko": "Korean title",
  "summary_en": ["bullet 1","bullet 2","bullet 3"],
  "summary_ko": ["요약1","요약2","요약3"],
  "impact_en": "One-line impact for Google Maps professionals",
  "impact_ko": "구글 맵스 전문가를 위한 한줄 영향 분석",
  "tags": ["tag1","tag2"],
  "confidence": 0.0-1.0,
  "relevance_score": 0.0-1.0,
  "region": "NA"|"EU"|"KR"|"Unknown",
  "source_url": "original link",
  "source_name": "source name"
}
Return ONLY a JSON array. No markdown. Max 5 items, pick the most relevant."#;

/// One numbered line per article, capped at [`MAX_PROMPT_ARTICLES`].
#[must_use]
pub fn build_manifest(articles: &[Article]) -> String {
    let mut out = String::new();
    for (i, article) in articles.iter().take(MAX_PROMPT_ARTICLES).enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(
            out,
            "{}. [{}] \"{}\" ({}) — {}",
            i + 1,
            article.region,
            article.title,
            article.source_name,
            article.link
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gmir_core::Region;

    fn article(n: usize) -> Article {
        Article {
            title: format!("Maps story {n}"),
            link: format!("https://e.com/{n}"),
            source_name: "Search Engine Land".to_string(),
            region: Region::Na,
        }
    }

    #[test]
    fn manifest_line_format() {
        let manifest = build_manifest(&[article(1)]);
        assert_eq!(
            manifest,
            "1. [NA] \"Maps story 1\" (Search Engine Land) — https://e.com/1"
        );
    }

    #[test]
    fn manifest_is_capped_in_order() {
        let articles: Vec<Article> = (1..=25).map(article).collect();
        let manifest = build_manifest(&articles);
        let lines: Vec<&str> = manifest.lines().collect();
        assert_eq!(lines.len(), MAX_PROMPT_ARTICLES);
        assert!(lines[0].starts_with("1. "));
        assert!(lines[19].starts_with("20. [NA] \"Maps story 20\""));
    }

    #[test]
    fn unknown_region_is_labelled() {
        let mut a = article(1);
        a.region = Region::Unknown;
        assert!(build_manifest(&[a]).starts_with("1. [Unknown] "));
    }
}

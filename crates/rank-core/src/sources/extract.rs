//! Rank extraction from a fetched quote page.
//!
//! The page layout is unversioned and has changed before, so the matching
//! strategy sits behind [`RankExtractor`] and can be swapped without touching
//! the fetch code.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::config::ExtractStrategy;
use crate::model::{Rating, ZacksRank};

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").expect("valid script regex"));
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b.*?</style\s*>").expect("valid style regex"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static RANK_PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Zacks Rank\s*#\s*([1-5])\s*-\s*(Strong\s+Buy|Strong\s+Sell|Buy|Hold|Sell)\b")
        .expect("valid rank phrase regex")
});
static RANK_VIEW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<p\b[^>]*\bclass\s*=\s*["'][^"']*\brank_view\b[^"']*["'][^>]*>(.*?)</p\s*>"#)
        .expect("valid rank_view regex")
});
static OF_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*of\s*\d+.*$").expect("valid suffix regex"));
static RANK_VIEW_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([1-5])\s*-\s*(Strong\s*Buy|Strong\s*Sell|Buy|Hold|Sell)")
        .expect("valid rank_view text regex")
});

/// Pulls a rank out of a raw HTML document
pub trait RankExtractor: Send + Sync {
    fn extract(&self, document: &str) -> Option<ZacksRank>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Scan the visible text for `Zacks Rank #N - Word`. The first match wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextPatternExtractor;

impl RankExtractor for TextPatternExtractor {
    fn extract(&self, document: &str) -> Option<ZacksRank> {
        let text = visible_text(document);
        let captures = RANK_PHRASE_RE.captures(&text)?;
        parse_rank(&captures[1], &captures[2])
    }

    fn name(&self) -> &'static str {
        "text-pattern"
    }
}

/// Read the `<p class="rank_view">` block, e.g. `3-Hold of 5`
#[derive(Debug, Clone, Copy, Default)]
pub struct RankViewExtractor;

impl RankExtractor for RankViewExtractor {
    fn extract(&self, document: &str) -> Option<ZacksRank> {
        let block = RANK_VIEW_RE.captures(document)?;
        let text = visible_text(&block[1]);
        let text = OF_SUFFIX_RE.replace(&text, "");
        let captures = RANK_VIEW_TEXT_RE.captures(&text)?;
        parse_rank(&captures[1], &captures[2])
    }

    fn name(&self) -> &'static str {
        "rank-view"
    }
}

/// Extractor implementing a configured strategy
pub fn extractor_for(strategy: ExtractStrategy) -> Arc<dyn RankExtractor> {
    match strategy {
        ExtractStrategy::TextPattern => Arc::new(TextPatternExtractor),
        ExtractStrategy::RankView => Arc::new(RankViewExtractor),
    }
}

fn parse_rank(digit: &str, phrase: &str) -> Option<ZacksRank> {
    let value = digit.parse().ok()?;
    let rating = Rating::from_phrase(phrase).or_else(|| {
        // "StrongBuy" when the markup glued the words together
        let spaced = phrase.to_ascii_lowercase().replace("strong", "strong ");
        Rating::from_phrase(&spaced)
    })?;
    ZacksRank::new(value, rating)
}

/// Text a browser would render: no scripts, styles, comments or tags,
/// common entities decoded and whitespace collapsed.
pub fn visible_text(html: &str) -> String {
    let text = SCRIPT_RE.replace_all(html, " ");
    let text = STYLE_RE.replace_all(&text, " ");
    let text = COMMENT_RE.replace_all(&text, " ");
    let text = TAG_RE.replace_all(&text, " ");
    let text = decode_entities(&text);
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&#35;", "#")
        .replace("&#x23;", "#")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_text_strips_markup() {
        let html = r#"<html><head><style>.x { color: red }</style>
            <script>var rank = "Zacks Rank #5 - Strong Sell";</script></head>
            <body><!-- Zacks Rank #4 - Sell --><p>Hello&nbsp;<b>world</b></p></body></html>"#;
        assert_eq!(visible_text(html), "Hello world");
    }

    #[test]
    fn test_text_pattern_match() {
        let html = "<div><span>Zacks Rank #2 - Buy</span> of 5</div>";
        let rank = TextPatternExtractor.extract(html).unwrap();
        assert_eq!(rank.value(), 2);
        assert_eq!(rank.rating(), Rating::Buy);
        assert_eq!(rank.label(), "2 - Buy");
    }

    #[test]
    fn test_text_pattern_across_tags_and_entities() {
        let html = "<p>Zacks Rank <strong>&#35;1</strong>&nbsp;-&nbsp;<em>Strong   Buy</em></p>";
        let rank = TextPatternExtractor.extract(html).unwrap();
        assert_eq!(rank.label(), "1 - Strong Buy");
    }

    #[test]
    fn test_text_pattern_first_match_wins() {
        let html = "<p>Zacks Rank #3 - Hold</p><aside>Peers: Zacks Rank #1 - Strong Buy</aside>";
        let rank = TextPatternExtractor.extract(html).unwrap();
        assert_eq!(rank.value(), 3);
        assert_eq!(rank.rating(), Rating::Hold);
    }

    #[test]
    fn test_text_pattern_ignores_script_content() {
        let html = r#"<script>track("Zacks Rank #5 - Strong Sell")</script>
            <p>Zacks Rank #2 - Buy</p>"#;
        assert_eq!(TextPatternExtractor.extract(html).unwrap().value(), 2);
    }

    #[test]
    fn test_text_pattern_prefers_longest_phrase() {
        let rank = TextPatternExtractor
            .extract("Zacks Rank #5 - Strong Sell")
            .unwrap();
        assert_eq!(rank.rating(), Rating::StrongSell);
    }

    #[test]
    fn test_text_pattern_no_match() {
        assert!(TextPatternExtractor.extract("<p>No rank here</p>").is_none());
        assert!(TextPatternExtractor.extract("Zacks Rank #7 - Buy").is_none());
        assert!(TextPatternExtractor.extract("Zacks Rank #3 - Neutral").is_none());
        assert!(TextPatternExtractor.extract("").is_none());
    }

    #[test]
    fn test_rank_view_block() {
        let html = r#"<div><p class="rank_view"> 3-Hold <span class="rank_chip">of 5</span></p></div>"#;
        let rank = RankViewExtractor.extract(html).unwrap();
        assert_eq!(rank.label(), "3 - Hold");
    }

    #[test]
    fn test_rank_view_glued_phrase() {
        let html = r#"<p class="quote rank_view">1-StrongBuy of 5</p>"#;
        let rank = RankViewExtractor.extract(html).unwrap();
        assert_eq!(rank.rating(), Rating::StrongBuy);
    }

    #[test]
    fn test_rank_view_missing_block() {
        let html = "<p class=\"other\">3-Hold</p>";
        assert!(RankViewExtractor.extract(html).is_none());
    }

    #[test]
    fn test_extractor_for_strategy() {
        assert_eq!(extractor_for(ExtractStrategy::TextPattern).name(), "text-pattern");
        assert_eq!(extractor_for(ExtractStrategy::RankView).name(), "rank-view");
    }
}

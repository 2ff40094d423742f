// Ranked extraction strategies for archived post markup.
//
// Each strategy is a pure `&Html -> Option<String>` so it can be exercised on
// a literal document. Order matters: the first strategy that yields a
// non-empty value wins.

use std::sync::LazyLock;

use scraper::{Html, Selector};

pub type Strategy = fn(&Html) -> Option<String>;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static OG_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[property="og:description"]"#));
static TWEET_TEXT_DIV: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"div[data-testid="tweetText"]"#));
static TWEET_TEXT_CLASS: LazyLock<Selector> = LazyLock::new(|| selector(".tweet-text"));
static JS_TWEET_TEXT_CLASS: LazyLock<Selector> = LazyLock::new(|| selector(".js-tweet-text"));
static TWEET_TEXT_ANY: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"[data-testid="tweetText"]"#));

static PUBLISHED_TIME: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[property="article:published_time"]"#));
static TIME_ELEMENT: LazyLock<Selector> = LazyLock::new(|| selector("time[datetime]"));
static TWEET_TIMESTAMP_CLASS: LazyLock<Selector> =
    LazyLock::new(|| selector(".tweet-timestamp"));
static JS_TWEET_TIMESTAMP_CLASS: LazyLock<Selector> =
    LazyLock::new(|| selector(".js-tweet-timestamp"));

/// Text sources, best first: page description metadata, the structured post
/// text region, then selectors from older page layouts.
pub const TEXT_STRATEGIES: &[(&str, Strategy)] = &[
    ("og_description", og_description),
    ("tweet_text_region", tweet_text_region),
    ("legacy_tweet_text", legacy_tweet_text),
    ("legacy_js_tweet_text", legacy_js_tweet_text),
    ("tweet_text_any", tweet_text_any),
];

/// Timestamp sources, best first. The archival capture time is not listed:
/// it is the caller's fallback when every strategy here comes up empty.
pub const TIMESTAMP_STRATEGIES: &[(&str, Strategy)] = &[
    ("published_time", published_time),
    ("time_element", time_element),
    ("legacy_tweet_timestamp", legacy_tweet_timestamp),
    ("legacy_js_tweet_timestamp", legacy_js_tweet_timestamp),
];

/// Run strategies in order and return the first non-empty value with its name.
pub fn first_match(
    document: &Html,
    strategies: &[(&'static str, Strategy)],
) -> Option<(&'static str, String)> {
    strategies
        .iter()
        .find_map(|(name, strategy)| strategy(document).map(|value| (*name, value)))
}

pub fn og_description(document: &Html) -> Option<String> {
    first_attr(document, &OG_DESCRIPTION, "content")
}

pub fn tweet_text_region(document: &Html) -> Option<String> {
    joined_text(document, &TWEET_TEXT_DIV)
}

pub fn legacy_tweet_text(document: &Html) -> Option<String> {
    joined_text(document, &TWEET_TEXT_CLASS)
}

pub fn legacy_js_tweet_text(document: &Html) -> Option<String> {
    joined_text(document, &JS_TWEET_TEXT_CLASS)
}

pub fn tweet_text_any(document: &Html) -> Option<String> {
    joined_text(document, &TWEET_TEXT_ANY)
}

pub fn published_time(document: &Html) -> Option<String> {
    first_attr(document, &PUBLISHED_TIME, "content")
}

pub fn time_element(document: &Html) -> Option<String> {
    first_attr(document, &TIME_ELEMENT, "datetime")
}

pub fn legacy_tweet_timestamp(document: &Html) -> Option<String> {
    first_attr(document, &TWEET_TIMESTAMP_CLASS, "title")
}

pub fn legacy_js_tweet_timestamp(document: &Html) -> Option<String> {
    first_attr(document, &JS_TWEET_TIMESTAMP_CLASS, "title")
}

/// Attribute of the first matching element.
fn first_attr(document: &Html, selector: &Selector, attr: &str) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .and_then(non_empty)
}

/// Text of every matching element, concatenated in document order.
fn joined_text(document: &Html, selector: &Selector) -> Option<String> {
    let text: String = document
        .select(selector)
        .flat_map(|el| el.text())
        .collect();
    non_empty(&text)
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

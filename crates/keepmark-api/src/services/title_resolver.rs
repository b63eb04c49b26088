//! Page title resolution for bookmarks saved without a title.
//!
//! ## Resolution Order
//!
//! The first non-empty candidate wins:
//! 1. `<title>` text
//! 2. `<meta property="og:title" content="...">`
//! 3. `<meta name="twitter:title" content="...">`
//! 4. Text of the first `<h1>`, inner tags stripped
//! 5. `"Untitled Page"`
//!
//! Candidates have common HTML entities decoded and whitespace collapsed.
//! Any transport failure, timeout, or non-2xx status is a [`Error::Fetch`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::Client;
use tracing::debug;

use keepmark_core::{Error, Result};

/// Outbound fetch timeout.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Sent so sites that block unknown clients still serve their HTML.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const UNTITLED_PAGE: &str = "Untitled Page";

/// Bytes of the page body read before extraction; the rest is ignored.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").unwrap());
static META_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<meta\b([^>]*)>").unwrap());
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>/]+))"#)
        .unwrap()
});
static H1_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1\s*>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});").unwrap()
});

/// Resolves a display title for a URL.
#[async_trait]
pub trait TitleResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<String>;
}

/// Fetches the page over HTTP and extracts its title.
#[derive(Clone)]
pub struct HttpTitleResolver {
    client: Client,
}

impl HttpTitleResolver {
    pub fn new() -> Result<Self> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TitleResolver for HttpTitleResolver {
    async fn resolve(&self, url: &str) -> Result<String> {
        let start = Instant::now();
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(Error::Fetch(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        let html = read_capped(response, MAX_BODY_BYTES).await?;
        let title = extract_title(&html);
        debug!(
            subsystem = "api",
            component = "title_resolver",
            op = "resolve",
            duration_ms = start.elapsed().as_millis() as u64,
            "Resolved page title"
        );
        Ok(title)
    }
}

/// Read at most `limit` body bytes, decoding lossily.
async fn read_capped(mut response: reqwest::Response, limit: usize) -> Result<String> {
    let mut body: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Pick a title out of an HTML document.
pub fn extract_title(html: &str) -> String {
    TITLE_RE
        .captures(html)
        .and_then(|c| clean_text(&c[1]))
        .or_else(|| meta_content(html, "property", "og:title"))
        .or_else(|| meta_content(html, "name", "twitter:title"))
        .or_else(|| {
            H1_RE
                .captures(html)
                .and_then(|c| clean_text(&TAG_RE.replace_all(&c[1], " ")))
        })
        .unwrap_or_else(|| UNTITLED_PAGE.to_string())
}

/// `content` of the first `<meta>` whose `key` attribute equals `value`.
fn meta_content(html: &str, key: &str, value: &str) -> Option<String> {
    META_RE.captures_iter(html).find_map(|meta| {
        let mut matches_key = false;
        let mut content = None;
        for attr in ATTR_RE.captures_iter(&meta[1]) {
            let attr_value = attr
                .get(2)
                .or_else(|| attr.get(3))
                .or_else(|| attr.get(4))
                .map_or("", |m| m.as_str());
            let name = &attr[1];
            if name.eq_ignore_ascii_case(key) && attr_value.trim().eq_ignore_ascii_case(value) {
                matches_key = true;
            } else if name.eq_ignore_ascii_case("content") {
                content = Some(attr_value);
            }
        }
        if matches_key {
            content.and_then(clean_text)
        } else {
            None
        }
    })
}

fn clean_text(raw: &str) -> Option<String> {
    let text = collapse_whitespace(&decode_entities(raw));
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode named entities in common use plus numeric character references.
/// Unknown entities are left as written.
pub fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    "ndash" => Some('\u{2013}'),
                    "mdash" => Some('\u{2014}'),
                    "hellip" => Some('\u{2026}'),
                    "copy" => Some('\u{a9}'),
                    "reg" => Some('\u{ae}'),
                    "laquo" => Some('\u{ab}'),
                    "raquo" => Some('\u{bb}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

//! Field validation for users, notes, and bookmarks.
//!
//! Raw request fields come in as `Option`s because the API accepts loosely
//! shaped JSON; these functions turn them into the validated input types or
//! an [`Error::InvalidInput`] carrying the user-facing message.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::models::{BookmarkInput, NoteInput};

/// Minimum username length after trimming.
pub const MIN_USERNAME_LEN: usize = 3;

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w-]+(\.[\w-]+)*@([\w-]+\.)+[a-zA-Z]{2,7}$").expect("valid email regex")
});

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://.+").expect("valid url regex"));

/// Raw registration fields.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Registration fields after validation. The password is still plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Return the trimmed value, or `None` if missing or blank.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(msg: &str) -> Error {
    Error::InvalidInput(msg.to_string())
}

/// Lowercase and trim an email so lookups and uniqueness are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_url(url: &str) -> bool {
    URL_RE.is_match(url)
}

/// Trim each tag and drop the blank ones, keeping order.
pub fn normalize_tags(tags: Option<Vec<String>>) -> Vec<String> {
    tags.unwrap_or_default()
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Parse a comma-separated `tags` query parameter.
///
/// Returns `None` when no usable tag remains, so an empty filter never
/// narrows the result set to nothing.
pub fn parse_tag_filter(raw: &str) -> Option<Vec<String>> {
    let tags: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if tags.is_empty() {
        None
    } else {
        Some(tags)
    }
}

pub fn validate_registration(reg: &Registration) -> Result<ValidRegistration> {
    let (Some(username), Some(email), Some(password)) = (
        present(reg.username.as_deref()),
        present(reg.email.as_deref()),
        reg.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(invalid("Please fill the required fields"));
    };

    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(Error::InvalidInput(format!(
            "Username must be at least {} characters",
            MIN_USERNAME_LEN
        )));
    }

    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(invalid("Please provide a valid email"));
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(ValidRegistration {
        username: username.to_string(),
        email,
        password: password.to_string(),
    })
}

/// Validate login fields, returning `(normalized_email, password)`.
pub fn validate_login(email: Option<&str>, password: Option<&str>) -> Result<(String, String)> {
    match (present(email), password.filter(|p| !p.is_empty())) {
        (Some(email), Some(password)) => Ok((normalize_email(email), password.to_string())),
        _ => Err(invalid("Please provide email and password")),
    }
}

pub fn validate_note(
    title: Option<&str>,
    content: Option<&str>,
    tags: Option<Vec<String>>,
    is_favorite: Option<bool>,
) -> Result<NoteInput> {
    let title = present(title).ok_or_else(|| invalid("Title is required"))?;
    // Content keeps its inner formatting; only blank content is rejected.
    let content = content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| invalid("Content is required"))?;

    Ok(NoteInput {
        title: title.to_string(),
        content: content.to_string(),
        tags: normalize_tags(tags),
        is_favorite: is_favorite.unwrap_or(false),
    })
}

/// Check a bookmark URL on its own, before any title resolution happens.
pub fn validate_bookmark_url(url: Option<&str>) -> Result<String> {
    let url = present(url).ok_or_else(|| invalid("URL is required"))?;
    if !is_valid_url(url) {
        return Err(invalid(
            "Please provide a valid URL starting with http:// or https://",
        ));
    }
    Ok(url.to_string())
}

pub fn validate_bookmark(
    url: Option<&str>,
    title: Option<&str>,
    description: Option<&str>,
    tags: Option<Vec<String>>,
    is_favorite: Option<bool>,
) -> Result<BookmarkInput> {
    let url = validate_bookmark_url(url)?;
    let title = present(title).ok_or_else(|| invalid("Title is required"))?;

    Ok(BookmarkInput {
        url,
        title: title.to_string(),
        description: description.unwrap_or_default().to_string(),
        tags: normalize_tags(tags),
        is_favorite: is_favorite.unwrap_or(false),
    })
}

/// True when a bookmark title was omitted or left blank and should be resolved.
pub fn needs_title(title: Option<&str>) -> bool {
    present(title).is_none()
}

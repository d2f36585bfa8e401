use crate::error::AuditError;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Reads a newline-delimited list of URLs and keeps the distinct, non-empty
/// lines that start with `domain`.
///
/// Lines that don't match are dropped silently; there is no further
/// validation of the URL syntax.
///
/// # Errors
///
/// Returns [`AuditError::Io`] if the file cannot be read.
///
/// # Example
///
/// ```rust,no_run
/// use pagespeed_audit::input::load_urls;
///
/// let urls = load_urls("urls.txt", "https://example.com").unwrap();
/// println!("{} unique URLs", urls.len());
/// ```
pub fn load_urls(path: impl AsRef<Path>, domain: &str) -> Result<BTreeSet<String>, AuditError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| AuditError::io(path, e))?;
    Ok(filter_urls(&content, domain))
}

/// Splits `content` by line and returns the set of non-empty lines starting with `domain`.
///
/// The prefix is matched against the line as written; only the stored value
/// is trimmed, so `"  https://a.com"` does not match `"https://"`.
pub fn filter_urls(content: &str, domain: &str) -> BTreeSet<String> {
    content
        .lines()
        .filter(|line| !line.is_empty() && line.starts_with(domain))
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(String::from)
        .collect()
}

/// Reads the API key from `path`, trimmed of surrounding whitespace.
pub fn load_api_key(path: impl AsRef<Path>) -> Result<String, AuditError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| AuditError::io(path, e))?;
    Ok(content.trim().to_string())
}

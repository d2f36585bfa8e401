use std::time::Duration;
use unicode_segmentation::UnicodeSegmentation;

/// Truncates a given string to a specified maximum width, appending an ellipsis (`…`)
/// if the string exceeds the specified width. Handles Unicode grapheme clusters properly.
///
/// # Panics
/// Panics if `max_width` is less than 2.
///
/// # Examples
/// ```rust
/// use pagespeed_audit::utils::truncate_message;
///
/// assert_eq!(truncate_message("https://example.com/about", 12), "https://exa…");
/// assert_eq!(truncate_message("Hi", 5), "Hi");
/// ```
pub fn truncate_message(message: &str, max_width: usize) -> String {
    assert!(
        max_width >= 2,
        "max_width must be at least 2 to accommodate the ellipsis"
    );

    let graphemes: Vec<&str> = message.graphemes(true).collect();

    if graphemes.len() > max_width {
        // Leave room for the ellipsis
        let truncated: String = graphemes[..max_width - 1].concat();
        format!("{}…", truncated)
    } else {
        message.to_string()
    }
}

pub fn percent(percent: f64) -> String {
    format!("{percent:.0}%")
}

/// A category score in `[0, 1]` shown on the familiar 0-100 scale.
pub fn score(score: f64) -> String {
    format!("{:.0}", score * 100.0)
}

pub fn secs(duration: Duration) -> String {
    let seconds = duration.as_secs_f64();
    format!("{seconds:.4}s")
}

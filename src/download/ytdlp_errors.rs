//! Classification of yt-dlp failures
//!
//! Maps raw engine error text to a fixed set of categories and renders a
//! stable, user-facing message for each one.

use indoc::formatdoc;

use crate::core::utils::{escape_html, truncate_chars};

/// Excerpt size for categories that carry specific guidance
pub const SHORT_EXCERPT_CHARS: usize = 150;
/// Excerpt size for the catch-all category
pub const LONG_EXCERPT_CHARS: usize = 300;

/// Category of an engine failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Site wants a login or fresh cookies
    AuthRequired,
    /// Too many requests
    RateLimited,
    /// Private, removed, or region-blocked media
    Unavailable,
    /// Everything else
    Generic,
}

/// Keyword groups in precedence order. The first group with a hit wins,
/// so "rate limit, please login" is `AuthRequired`.
const KEYWORD_TABLE: &[(&[&str], ErrorCategory)] = &[
    (&["login", "cookies", "sign in"], ErrorCategory::AuthRequired),
    (&["rate", "limit"], ErrorCategory::RateLimited),
    (&["not available", "unavailable"], ErrorCategory::Unavailable),
];

/// Classifies raw engine error text. Total: unknown text is `Generic`.
///
/// # Example
///
/// ```
/// use grabbot::download::ytdlp_errors::{classify, ErrorCategory};
///
/// assert_eq!(classify("Sign in to confirm you're not a bot"), ErrorCategory::AuthRequired);
/// assert_eq!(classify("HTTP Error 429: Too Many Requests (rate limited)"), ErrorCategory::RateLimited);
/// assert_eq!(classify("something odd"), ErrorCategory::Generic);
/// ```
pub fn classify(raw: &str) -> ErrorCategory {
    let lower = raw.to_lowercase();

    KEYWORD_TABLE
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(_, category)| *category)
        .unwrap_or(ErrorCategory::Generic)
}

impl ErrorCategory {
    /// Log level for a failure in this category. Generic failures are the
    /// ones an operator should look at.
    pub fn log_level(self) -> log::Level {
        match self {
            ErrorCategory::AuthRequired | ErrorCategory::Generic => log::Level::Error,
            ErrorCategory::RateLimited => log::Level::Warn,
            ErrorCategory::Unavailable => log::Level::Info,
        }
    }

    fn excerpt_limit(self) -> usize {
        match self {
            ErrorCategory::Generic => LONG_EXCERPT_CHARS,
            _ => SHORT_EXCERPT_CHARS,
        }
    }
}

fn excerpt(raw: &str, max_chars: usize) -> String {
    escape_html(&truncate_chars(raw.trim(), max_chars))
}

/// Renders the HTML message for a classified failure.
pub fn render(category: ErrorCategory, raw: &str) -> String {
    let details = excerpt(raw, category.excerpt_limit());

    match category {
        ErrorCategory::AuthRequired => formatdoc! {"
            ❌ <b>Authentication required</b>

            This site wants a signed-in session before it will serve the video. \
            Try another link or try again later.

            <i>{details}</i>",
            details = details
        },
        ErrorCategory::RateLimited => formatdoc! {"
            ⏳ <b>Too many requests</b>

            The site is rate limiting downloads right now. Wait a few minutes and send the link again.

            <i>{details}</i>",
            details = details
        },
        ErrorCategory::Unavailable => formatdoc! {"
            🚫 <b>Video unavailable</b>

            It may be private, removed, or blocked in this region.

            <i>{details}</i>",
            details = details
        },
        ErrorCategory::Generic => formatdoc! {"
            ❌ <b>Download failed</b>

            Check that the link is correct and try again.

            <code>{details}</code>",
            details = details
        },
    }
}

/// Message for a file that was downloaded but could not be sent.
pub fn render_transfer_error(raw: &str) -> String {
    let details = excerpt(raw, LONG_EXCERPT_CHARS);
    formatdoc! {"
        ❌ <b>Could not send the file</b>

        The video was downloaded but the upload failed.

        <code>{details}</code>",
        details = details
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_auth() {
        assert_eq!(classify("Sign in to confirm you're not a bot"), ErrorCategory::AuthRequired);
        assert_eq!(
            classify("ERROR: The provided YouTube account cookies are no longer valid"),
            ErrorCategory::AuthRequired
        );
        assert_eq!(classify("LOGIN REQUIRED"), ErrorCategory::AuthRequired);
    }

    #[test]
    fn test_classify_rate_and_unavailable() {
        assert_eq!(classify("HTTP Error 429: rate exceeded"), ErrorCategory::RateLimited);
        assert_eq!(classify("Daily LIMIT reached"), ErrorCategory::RateLimited);
        assert_eq!(classify("ERROR: Video unavailable"), ErrorCategory::Unavailable);
        assert_eq!(classify("This content is not available in your country"), ErrorCategory::Unavailable);
    }

    #[test]
    fn test_classify_precedence() {
        assert_eq!(classify("rate limited, please login"), ErrorCategory::AuthRequired);
        assert_eq!(classify("video unavailable due to rate limit"), ErrorCategory::RateLimited);
        assert_eq!(classify("cookies expired, video unavailable"), ErrorCategory::AuthRequired);
    }

    #[test]
    fn test_classify_is_total() {
        for raw in ["", "   ", "ERROR: [generic] unsupported URL", "💥", "Connection reset by peer"] {
            assert_eq!(classify(raw), ErrorCategory::Generic, "{:?}", raw);
        }
    }

    #[test]
    fn test_classify_is_deterministic() {
        let raw = "ERROR: [youtube] abc: Sign in to confirm your age";
        assert_eq!(classify(raw), classify(raw));
    }

    #[test]
    fn test_render_auth_template() {
        let text = render(ErrorCategory::AuthRequired, "Sign in to confirm you're not a bot");
        assert!(text.starts_with("❌ <b>Authentication required</b>"));
        assert!(text.contains("Sign in to confirm you're not a bot"));
    }

    #[test]
    fn test_render_truncates_specific_categories() {
        let raw = "x".repeat(1000);
        let text = render(ErrorCategory::RateLimited, &raw);
        assert!(!text.contains(&"x".repeat(SHORT_EXCERPT_CHARS + 1)));
        assert!(text.contains(&format!("{}…", "x".repeat(SHORT_EXCERPT_CHARS))));
    }

    #[test]
    fn test_render_generic_has_longer_excerpt() {
        let raw = "y".repeat(1000);
        let text = render(ErrorCategory::Generic, &raw);
        assert!(text.contains(&"y".repeat(LONG_EXCERPT_CHARS)));
        assert!(!text.contains(&"y".repeat(LONG_EXCERPT_CHARS + 1)));
    }

    #[test]
    fn test_render_escapes_html() {
        let text = render(ErrorCategory::Generic, "<script>alert(1)</script>");
        assert!(text.contains("&lt;script&gt;"));
        assert!(!text.contains("<script>"));
    }

    #[test]
    fn test_templates_are_distinct() {
        let raw = "same raw text";
        let rendered: Vec<_> = [
            ErrorCategory::AuthRequired,
            ErrorCategory::RateLimited,
            ErrorCategory::Unavailable,
            ErrorCategory::Generic,
        ]
        .into_iter()
        .map(|c| render(c, raw))
        .collect();

        for (i, a) in rendered.iter().enumerate() {
            for b in rendered.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_render_transfer_error() {
        assert!(render_transfer_error("file is too big").contains("Could not send the file"));
    }
}

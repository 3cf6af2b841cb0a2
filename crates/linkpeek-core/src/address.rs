#![forbid(unsafe_code)]

//! Address bar interpretation.
//!
//! Free text typed into the preview's address field is either a URL (loaded
//! as-is, with `https://` added when the scheme is missing) or a search
//! query sent to [`SEARCH_ENDPOINT`].

use core::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

/// Query endpoint for text that is not a URL.
pub const SEARCH_ENDPOINT: &str = "https://www.google.com/search?q=";

/// Scheme prepended to bare host names.
pub const DEFAULT_SCHEME: &str = "https://";

/// How long the copy button shows its confirmation.
pub const COPY_FEEDBACK_DELAY: Duration = Duration::from_millis(1000);

/// Shortest bare text (e.g. `a.io`) considered for scheme completion.
const MIN_BARE_HOST_LEN: usize = 4;

/// Schemes that run script in the previewed page instead of loading one.
const SCRIPT_SCHEMES: &[&str] = &["javascript", "vbscript"];

/// Characters escaped by `encodeURIComponent`.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Where submitted text leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressTarget {
    /// Text recognised as a URL, normalised with a scheme.
    Url(String),
    /// Text sent to the search endpoint.
    Search { query: String, url: String },
}

impl AddressTarget {
    /// The URL to load.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) | Self::Search { url, .. } => url,
        }
    }

    #[must_use]
    pub fn search(query: &str) -> Self {
        Self::Search {
            query: query.to_owned(),
            url: search_url(query),
        }
    }
}

/// Interpret submitted text. Blank input yields `None`.
#[must_use]
pub fn classify(raw: &str) -> Option<AddressTarget> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    if is_absolute_url(text) {
        return Some(AddressTarget::Url(text.to_owned()));
    }
    if looks_like_bare_host(text) {
        return Some(AddressTarget::Url(format!("{DEFAULT_SCHEME}{text}")));
    }
    Some(AddressTarget::search(text))
}

/// Search endpoint URL for `query`, escaped like `encodeURIComponent`.
#[must_use]
pub fn search_url(query: &str) -> String {
    format!(
        "{SEARCH_ENDPOINT}{}",
        utf8_percent_encode(query, QUERY_COMPONENT)
    )
}

/// Whether `text` is already a complete URL.
///
/// `localhost:3000` and `example.com:8080` parse with a bogus scheme; a
/// scheme containing `.` or followed by a digit is a `host:port` and is left
/// to [`looks_like_bare_host`]. Script schemes are never loaded.
#[must_use]
pub fn is_absolute_url(text: &str) -> bool {
    if text.chars().any(char::is_whitespace) {
        return false;
    }
    let Ok(url) = Url::parse(text) else {
        return false;
    };
    let after_scheme = text.split_once(':').map_or("", |(_, rest)| rest);
    let host_port = url.scheme().contains('.')
        || after_scheme.starts_with(|c: char| c.is_ascii_digit());
    !host_port && !SCRIPT_SCHEMES.contains(&url.scheme())
}

/// Whether `text` becomes a URL once [`DEFAULT_SCHEME`] is prepended.
#[must_use]
pub fn looks_like_bare_host(text: &str) -> bool {
    if text.len() < MIN_BARE_HOST_LEN
        || !text.contains('.')
        || text.chars().any(char::is_whitespace)
    {
        return false;
    }
    Url::parse(&format!("{DEFAULT_SCHEME}{text}")).is_ok_and(|url| url.has_host())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn blank_input_is_ignored() {
        assert_eq!(classify(""), None);
        assert_eq!(classify("   \t"), None);
    }

    #[test]
    fn bare_host_gets_scheme() {
        assert_eq!(
            classify("example.com"),
            Some(AddressTarget::Url("https://example.com".into()))
        );
        assert_eq!(
            classify("  docs.rs/serde  "),
            Some(AddressTarget::Url("https://docs.rs/serde".into()))
        );
    }

    #[test]
    fn absolute_url_is_kept() {
        assert_eq!(
            classify("http://example.com/a?b=c"),
            Some(AddressTarget::Url("http://example.com/a?b=c".into()))
        );
        assert_eq!(
            classify("about:blank"),
            Some(AddressTarget::Url("about:blank".into()))
        );
    }

    #[test]
    fn hostless_schemes_are_kept_verbatim() {
        for text in [
            "mailto:someone@example.com",
            "tel:+1.555.0100",
            "sms:+15550100?body=hi.there",
            "data:text/plain,a.b",
        ] {
            assert_eq!(
                classify(text),
                Some(AddressTarget::Url(text.into())),
                "{text}"
            );
        }
    }

    #[test]
    fn localhost_port_is_not_a_scheme() {
        assert!(!is_absolute_url("localhost:3000"));
        assert!(!is_absolute_url("example.com:8080/x"));
        assert!(matches!(
            classify("localhost:3000"),
            Some(AddressTarget::Search { .. })
        ));
    }

    #[test]
    fn host_with_port_gets_scheme() {
        assert_eq!(
            classify("example.com:8080/x"),
            Some(AddressTarget::Url("https://example.com:8080/x".into()))
        );
    }

    #[test]
    fn words_become_search() {
        assert_eq!(
            classify("best pizza near me"),
            Some(AddressTarget::Search {
                query: "best pizza near me".into(),
                url: "https://www.google.com/search?q=best%20pizza%20near%20me".into(),
            })
        );
    }

    #[test]
    fn sentence_with_period_is_search() {
        let target = classify("what is rust lang.").unwrap();
        assert!(matches!(target, AddressTarget::Search { .. }));
    }

    #[test]
    fn single_word_is_search() {
        assert_eq!(
            classify("rust").unwrap().url(),
            "https://www.google.com/search?q=rust"
        );
    }

    #[test]
    fn script_scheme_is_searched_not_loaded() {
        let target = classify("javascript:alert(1)").unwrap();
        assert!(matches!(target, AddressTarget::Search { .. }));
    }

    #[test]
    fn search_escapes_like_encode_uri_component() {
        assert_eq!(
            search_url("a&b=c/d?é (x)"),
            "https://www.google.com/search?q=a%26b%3Dc%2Fd%3F%C3%A9%20(x)"
        );
    }
}

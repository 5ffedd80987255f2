//! URL resolution for intercepted requests and configured resource lists.

use url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a URL string against the site origin.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Absolute URLs are taken as-is (any scheme); everything else is joined
///    onto `base`
/// 3. Remove fragment (#...)
/// 4. Keep query string intact (do not reorder)
///
/// Host lowercasing is done by the parser for http(s) URLs.
pub fn resolve(base: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            base.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
        }
        Err(e) => return Err(UrlError::InvalidUrl(e.to_string())),
    };

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Reject URLs the network stack cannot fetch.
pub fn ensure_fetchable(url: &Url) -> Result<(), UrlError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://read.example.com").unwrap()
    }

    #[test]
    fn test_resolve_relative_path() {
        let url = resolve(&origin(), "/reader.html").unwrap();
        assert_eq!(url.as_str(), "https://read.example.com/reader.html");
    }

    #[test]
    fn test_resolve_root() {
        let url = resolve(&origin(), "/").unwrap();
        assert_eq!(url.path(), "/");
    }

    #[test]
    fn test_resolve_absolute_other_host() {
        let url = resolve(&origin(), "https://docs.bccsw.cn/logo.png").unwrap();
        assert_eq!(url.host_str(), Some("docs.bccsw.cn"));
    }

    #[test]
    fn test_resolve_lowercase_host() {
        let url = resolve(&origin(), "https://EXAMPLE.COM/a.css").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_resolve_remove_fragment() {
        let url = resolve(&origin(), "/reader.html#chapter-2").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/reader.html");
    }

    #[test]
    fn test_resolve_preserve_query() {
        let url = resolve(&origin(), "https://fonts.googleapis.com/css2?family=Noto+Sans+SC&display=swap").unwrap();
        assert_eq!(url.query(), Some("family=Noto+Sans+SC&display=swap"));
    }

    #[test]
    fn test_resolve_keeps_extension_scheme() {
        let url = resolve(&origin(), "chrome-extension://abcdef/content.js").unwrap();
        assert_eq!(url.scheme(), "chrome-extension");
    }

    #[test]
    fn test_resolve_trim_whitespace() {
        let url = resolve(&origin(), "  /index.html  ").unwrap();
        assert_eq!(url.as_str(), "https://read.example.com/index.html");
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&origin(), ""), Err(UrlError::Empty)));
        assert!(matches!(resolve(&origin(), "   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_ensure_fetchable() {
        assert!(ensure_fetchable(&Url::parse("http://example.com").unwrap()).is_ok());
        assert!(ensure_fetchable(&Url::parse("https://example.com").unwrap()).is_ok());

        let result = ensure_fetchable(&Url::parse("chrome-extension://abc/x.js").unwrap());
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(s)) if s == "chrome-extension"));
    }
}

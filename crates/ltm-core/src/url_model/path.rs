//! Share token extraction from URL path.

/// Extracts the share token (the single path segment) from a share URL.
///
/// Returns `None` if the URL cannot be parsed, is not http(s), or its path
/// does not consist of exactly one non-empty segment.
pub fn share_token(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    parsed.host_str()?;
    let mut segments = parsed.path().split('/').filter(|s| !s.is_empty());
    let token = segments.next()?;
    if segments.next().is_some() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_segment() {
        assert_eq!(
            share_token("https://drive.example.com/iab12cd").as_deref(),
            Some("iab12cd")
        );
        assert_eq!(
            share_token("https://drive.example.com/b0f1ab2cd/").as_deref(),
            Some("b0f1ab2cd")
        );
    }

    #[test]
    fn root_nested_or_foreign_scheme() {
        assert_eq!(share_token("https://drive.example.com/"), None);
        assert_eq!(share_token("https://drive.example.com/a/b"), None);
        assert_eq!(share_token("ftp://drive.example.com/iab12cd"), None);
        assert_eq!(share_token("not a url"), None);
    }

    #[test]
    fn with_query() {
        assert_eq!(
            share_token("https://drive.example.com/iab12cd?from=share").as_deref(),
            Some("iab12cd")
        );
    }
}

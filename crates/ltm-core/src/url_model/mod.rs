//! Share-link modeling.
//!
//! Classifies share URLs as file or folder links (which decides between a
//! single-file and a directory transfer) and extracts links plus passwords
//! from pasted text.

mod path;
mod share_text;

pub use path::share_token;
pub use share_text::parse_share_text;

/// Minimum length of the alphanumeric share token.
const MIN_TOKEN_LEN: usize = 5;

/// What a share URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    File,
    Folder,
    Unknown,
}

impl ResourceKind {
    /// Classifies a share URL by the shape of its token.
    ///
    /// Folder tokens are `b` followed by at least five alphanumerics; any
    /// other alphanumeric token of at least five characters is a file.
    pub fn classify(url: &str) -> Self {
        let Some(token) = share_token(url) else {
            return ResourceKind::Unknown;
        };
        if !token.chars().all(|c| c.is_ascii_alphanumeric()) {
            return ResourceKind::Unknown;
        }
        match token.strip_prefix('b') {
            Some(rest) if rest.len() >= MIN_TOKEN_LEN => ResourceKind::Folder,
            _ if token.len() >= MIN_TOKEN_LEN => ResourceKind::File,
            _ => ResourceKind::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_links() {
        assert_eq!(
            ResourceKind::classify("https://d.example.com/iab12cd"),
            ResourceKind::File
        );
        assert_eq!(
            ResourceKind::classify("https://d.example.com/x9y8z7"),
            ResourceKind::File
        );
    }

    #[test]
    fn folder_links() {
        assert_eq!(
            ResourceKind::classify("https://d.example.com/b0f1ab2cd"),
            ResourceKind::Folder
        );
    }

    #[test]
    fn short_b_token_is_a_file() {
        assert_eq!(
            ResourceKind::classify("https://d.example.com/bab12"),
            ResourceKind::File
        );
    }

    #[test]
    fn unknown_shapes() {
        assert_eq!(ResourceKind::classify("https://d.example.com/ab"), ResourceKind::Unknown);
        assert_eq!(
            ResourceKind::classify("https://d.example.com/a-b-c-d-e"),
            ResourceKind::Unknown
        );
        assert_eq!(ResourceKind::classify("garbage"), ResourceKind::Unknown);
    }
}

//! Extract a share link and its password from pasted free text.

/// Finds the first http(s) link in `text` and the password that follows it.
///
/// The password is the first run of lowercase ASCII letters and digits after
/// the link, skipping any other characters in between. A run directly
/// followed by `:`, `：` or `=` is a label (`pwd:`) and is skipped too.
/// Returns `None` when the text holds no link.
///
/// # Examples
///
/// - `"https://d.example.com/iab12cd pwd:x1y2"` → `("https://d.example.com/iab12cd", "x1y2")`
/// - `"see https://d.example.com/b0f1ab2cd"` → `("https://d.example.com/b0f1ab2cd", "")`
pub fn parse_share_text(text: &str) -> Option<(String, String)> {
    let start = find_link_start(text)?;
    let rest = &text[start..];
    let end = rest
        .char_indices()
        .find(|(_, c)| !is_link_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    let url = rest[..end].trim_end_matches(['.', ',', ';', ':', ')']);
    let after = &rest[url.len()..];

    Some((url.to_string(), first_password(after).to_string()))
}

fn first_password(mut text: &str) -> &str {
    loop {
        let Some(start) = text.find(is_password_char) else {
            return "";
        };
        let run = &text[start..];
        let len = run.find(|c| !is_password_char(c)).unwrap_or(run.len());
        let (word, rest) = run.split_at(len);
        if !rest.starts_with([':', '：', '=']) {
            return word;
        }
        text = rest;
    }
}

fn find_link_start(text: &str) -> Option<usize> {
    let http = text.find("http://");
    let https = text.find("https://");
    match (http, https) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn is_link_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ':' | '/' | '.' | '-' | '_' | '?' | '=' | '&' | '%' | '#')
}

fn is_password_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

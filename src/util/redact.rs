use crate::Auth;

pub(crate) fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

pub(crate) fn redact_text(text: String, auth: Option<&Auth>) -> String {
    let Some(auth) = auth else {
        return text;
    };

    auth.secrets()
        .into_iter()
        .filter(|secret| !secret.is_empty())
        .fold(text, |acc, secret| acc.replace(secret, "<redacted>"))
}

//! Cross-site request forgery tokens.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Form field carrying the token.
pub const XSRF_FIELD: &str = "_xsrf";

/// Header accepted in place of the form field (AJAX requests).
pub const XSRF_HEADER: &str = "x-xsrf-token";

/// Lifetime of the token cookie, in seconds.
pub const XSRF_MAX_AGE: i64 = 600;

pub const TOKEN_LEN: usize = 32;

pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Compare in time independent of where the first difference is.
pub fn tokens_match(expected: &str, given: &str) -> bool {
    let (a, b) = (expected.as_bytes(), given.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Hidden input for HTML forms.
pub fn form_html(token: &str) -> String {
    format!(
        r#"<input type="hidden" name="{XSRF_FIELD}" value="{}">"#,
        tera::escape_html(token)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("abc", "abc"));
        assert!(!tokens_match("abc", "abd"));
        assert!(!tokens_match("abc", "abcd"));
        assert!(!tokens_match("abc", ""));
    }

    #[test]
    fn test_form_html() {
        assert_eq!(
            form_html("tok"),
            r#"<input type="hidden" name="_xsrf" value="tok">"#
        );
    }
}

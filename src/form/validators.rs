//! Field validators.
//!
//! A validator checks one trimmed value and returns the failure message
//! without the field label; [`Field`](crate::form::Field) prefixes it.

use regex::Regex;
use std::sync::OnceLock;

/// One check on a submitted value.
pub trait Validator: Send + Sync {
    fn verify(&self, value: &str) -> Result<(), String>;

    /// Whether an empty value fails this validator. Other validators are
    /// skipped for empty values.
    fn requires_value(&self) -> bool {
        false
    }
}

/// Rejects empty values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Required;

impl Validator for Required {
    fn verify(&self, value: &str) -> Result<(), String> {
        if value.is_empty() {
            Err("is required".to_string())
        } else {
            Ok(())
        }
    }

    fn requires_value(&self) -> bool {
        true
    }
}

/// Accepts values the expression matches.
#[derive(Debug, Clone)]
pub struct Regexp {
    regex: Regex,
    message: String,
}

impl Regexp {
    /// Compile `expr`. The expression is used as written, so anchor it to
    /// match whole values.
    pub fn new(expr: &str, message: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(expr)?,
            message: message.into(),
        })
    }
}

impl Validator for Regexp {
    fn verify(&self, value: &str) -> Result<(), String> {
        check(&self.regex, value, &self.message)
    }
}

fn check(regex: &Regex, value: &str, message: &str) -> Result<(), String> {
    if regex.is_match(value) {
        Ok(())
    } else {
        Err(message.to_string())
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^.@\s][^@\s]*\.[a-zA-Z]{2,10}$").expect("email regex is valid")
    })
}

fn url_regex() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| {
        Regex::new(r"^https?://([^/:\s]+|([0-9]{1,3}\.){3}[0-9]{1,3})(:[0-9]{1,5})?(/\S*)?$")
            .expect("url regex is valid")
    })
}

fn int_regex() -> &'static Regex {
    static INT: OnceLock<Regex> = OnceLock::new();
    INT.get_or_init(|| Regex::new(r"^-?[0-9]+$").expect("int regex is valid"))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Email;

impl Validator for Email {
    fn verify(&self, value: &str) -> Result<(), String> {
        check(email_regex(), value, "is not a valid email address")
    }
}

/// `http` or `https` URLs with a host name or dotted IPv4 address.
#[derive(Debug, Clone, Copy, Default)]
pub struct Url;

impl Validator for Url {
    fn verify(&self, value: &str) -> Result<(), String> {
        check(url_regex(), value, "is not a valid URL")
    }
}

/// Base-10 integers with an optional leading minus.
#[derive(Debug, Clone, Copy, Default)]
pub struct Int;

impl Validator for Int {
    fn verify(&self, value: &str) -> Result<(), String> {
        check(int_regex(), value, "is not a valid integer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        assert!(Required.verify("x").is_ok());
        assert_eq!(Required.verify("").unwrap_err(), "is required");
        assert!(Required.requires_value());
        assert!(!Email.requires_value());
    }

    #[test]
    fn test_email() {
        assert!(Email.verify("frank@example.com").is_ok());
        assert!(Email.verify("a.b+c@mail.example.org").is_ok());
        assert!(Email.verify("frank@example").is_err());
        assert!(Email.verify("frank@.com").is_err());
        assert!(Email.verify("no at sign.com").is_err());
    }

    #[test]
    fn test_url() {
        assert!(Url.verify("https://example.com").is_ok());
        assert!(Url.verify("http://10.0.0.1:8080/a/b?c=d").is_ok());
        assert!(Url.verify("ftp://example.com").is_err());
        assert!(Url.verify("example.com").is_err());
    }

    #[test]
    fn test_int() {
        assert!(Int.verify("42").is_ok());
        assert!(Int.verify("-7").is_ok());
        assert!(Int.verify("4.2").is_err());
        assert!(Int.verify("seven").is_err());
    }

    #[test]
    fn test_regexp() {
        let zip = Regexp::new(r"^\d{5}$", "must be five digits").unwrap();
        assert!(zip.verify("12345").is_ok());
        assert_eq!(zip.verify("1234").unwrap_err(), "must be five digits");
        assert!(Regexp::new("(", "broken").is_err());
    }
}

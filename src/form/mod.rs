//! Form binding and validation.
//!
//! # Data Flow
//! ```text
//! Form::new().field(Field::new(..).validator(..))
//!     → RequestContext::validate_form
//!         → bind: each field takes its trimmed request value (missing = "")
//!         → validate: per-field validators, messages kept per field
//!         → assigned to the template data bag as `form`
//!     → handler branches on the result, reads errors() / all_errors()
//! ```
//!
//! # Design Decisions
//! - Fields keep declaration order, so error listings are stable
//! - A form is built per request, like handlers
//! - Templates see `form.values`, `form.errors.<field>`, `form.all_errors`
//!   and `form.valid`; secret fields never appear in `form.values`

pub mod field;
pub mod validators;

pub use field::Field;
pub use validators::{Email, Int, Regexp, Required, Url, Validator};

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::http::request::FormData;

/// A set of fields bound from one submission.
#[derive(Debug, Default)]
pub struct Form {
    fields: Vec<Field>,
    validated: bool,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Take each field's first submitted value, trimmed.
    pub fn bind(&mut self, data: &FormData) {
        for field in &mut self.fields {
            field.set_value(data.get(field.name()).unwrap_or(""));
        }
        self.validated = false;
    }

    /// Validate every field. True when none reported an error.
    pub fn validate(&mut self) -> bool {
        let mut valid = true;
        for field in &mut self.fields {
            valid &= field.validate();
        }
        self.validated = true;
        valid
    }

    /// True once validated with no errors.
    pub fn is_valid(&self) -> bool {
        self.validated && self.fields.iter().all(|f| f.errors().is_empty())
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(Field::value)
    }

    /// Overwrite a bound value. Returns false for an unknown field.
    pub fn set_value(&mut self, name: &str, value: &str) -> bool {
        match self.fields.iter_mut().find(|f| f.name() == name) {
            Some(field) => {
                field.set_value(value);
                true
            }
            None => false,
        }
    }

    /// Messages for one field; empty for unknown or valid fields.
    pub fn errors(&self, name: &str) -> &[String] {
        self.get(name).map(Field::errors).unwrap_or(&[])
    }

    /// Fields with at least one message.
    pub fn error_map(&self) -> BTreeMap<&str, &[String]> {
        self.fields
            .iter()
            .filter(|f| !f.errors().is_empty())
            .map(|f| (f.name(), f.errors()))
            .collect()
    }

    /// Every message, in field order.
    pub fn all_errors(&self) -> Vec<&str> {
        self.fields
            .iter()
            .flat_map(|f| f.errors().iter().map(String::as_str))
            .collect()
    }
}

#[derive(Serialize)]
struct FormView<'a> {
    values: BTreeMap<&'a str, &'a str>,
    errors: BTreeMap<&'a str, &'a [String]>,
    all_errors: Vec<&'a str>,
    valid: bool,
}

impl Serialize for Form {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        FormView {
            values: self
                .fields
                .iter()
                .filter(|f| !f.is_secret())
                .map(|f| (f.name(), f.value()))
                .collect(),
            errors: self.fields.iter().map(|f| (f.name(), f.errors())).collect(),
            all_errors: self.all_errors(),
            valid: self.is_valid(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn signup() -> Form {
        Form::new()
            .field(Field::new("email", "Email").validator(Required).validator(Email))
            .field(Field::new("site", "Website").validator(Url))
            .field(Field::new("age", "Age").validator(Int))
            .field(Field::new("password", "Password").validator(Required).secret())
    }

    fn data(pairs: &[(&str, &str)]) -> FormData {
        let mut data = FormData::new();
        for (name, value) in pairs {
            data.insert(*name, *value);
        }
        data
    }

    #[test]
    fn test_bind_and_validate() {
        let mut form = signup();
        assert!(!form.is_valid());
        form.bind(&data(&[
            ("email", " frank@example.com "),
            ("age", "33"),
            ("password", "hunter2"),
        ]));
        assert!(form.validate());
        assert!(form.is_valid());
        assert_eq!(form.value("email"), Some("frank@example.com"));
        assert_eq!(form.value("site"), Some(""));
        assert!(form.all_errors().is_empty());
    }

    #[test]
    fn test_errors_per_field() {
        let mut form = signup();
        form.bind(&data(&[("email", "nope"), ("site", "ftp://x"), ("age", "old")]));
        assert!(!form.validate());
        assert_eq!(form.errors("email"), &["Email is not a valid email address".to_string()]);
        assert_eq!(form.errors("password"), &["Password is required".to_string()]);
        assert!(form.errors("missing").is_empty());
        assert_eq!(
            form.all_errors(),
            vec![
                "Email is not a valid email address",
                "Website is not a valid URL",
                "Age is not a valid integer",
                "Password is required",
            ]
        );
        assert_eq!(form.error_map().len(), 4);
    }

    #[test]
    fn test_rebinding_clears_validation() {
        let mut form = signup();
        form.bind(&data(&[("email", "a@b.io"), ("password", "x")]));
        assert!(form.validate());
        assert!(form.set_value("email", "broken"));
        assert!(!form.set_value("nothing", "x"));
        assert!(!form.validate());
        form.bind(&data(&[]));
        assert!(!form.is_valid());
    }

    #[test]
    fn test_template_view_hides_secrets() {
        let mut form = signup();
        form.bind(&data(&[("email", "bad"), ("password", "hunter2")]));
        form.validate();
        let view = serde_json::to_value(&form).unwrap();
        assert_eq!(view["values"]["email"], json!("bad"));
        assert!(view["values"].get("password").is_none());
        assert_eq!(view["errors"]["email"], json!(["Email is not a valid email address"]));
        assert_eq!(view["errors"]["site"], json!([]));
        assert_eq!(view["valid"], json!(false));
        assert_eq!(view["all_errors"].as_array().unwrap().len(), 1);
    }
}

//! Named form fields.

use crate::form::validators::Validator;

/// One input of a [`Form`](crate::form::Form): its name in the request,
/// a label for messages, the bound value and its validators.
pub struct Field {
    name: String,
    label: String,
    value: String,
    secret: bool,
    validators: Vec<Box<dyn Validator>>,
    errors: Vec<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            value: String::new(),
            secret: false,
            validators: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Initial value shown before a submission is bound.
    pub fn initial(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Never echo the value back to templates (passwords).
    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_secret(&self) -> bool {
        self.secret
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub(crate) fn set_value(&mut self, value: &str) {
        self.value = value.trim().to_string();
    }

    /// Run the validators and keep their messages.
    ///
    /// An empty value reports only the failing `requires_value` validator,
    /// or passes when there is none.
    pub(crate) fn validate(&mut self) -> bool {
        self.errors.clear();
        if self.value.is_empty() {
            if let Some(Err(message)) = self
                .validators
                .iter()
                .find(|v| v.requires_value())
                .map(|v| v.verify(&self.value))
            {
                self.errors.push(format!("{} {message}", self.label));
            }
            return self.errors.is_empty();
        }

        for validator in &self.validators {
            if let Err(message) = validator.verify(&self.value) {
                self.errors.push(format!("{} {message}", self.label));
            }
        }
        self.errors.is_empty()
    }
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("validators", &self.validators.len())
            .field("errors", &self.errors)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::validators::{Email, Regexp, Required};

    #[test]
    fn test_empty_required_reports_once() {
        let mut field = Field::new("email", "Email").validator(Required).validator(Email);
        field.set_value("   ");
        assert!(!field.validate());
        assert_eq!(field.errors(), &["Email is required".to_string()]);
    }

    #[test]
    fn test_empty_optional_passes() {
        let mut field = Field::new("site", "Site").validator(Email);
        field.set_value("");
        assert!(field.validate());
        assert!(field.errors().is_empty());
    }

    #[test]
    fn test_every_failure_is_kept() {
        let short = Regexp::new(r"^.{1,8}$", "is too long").unwrap();
        let mut field = Field::new("email", "Email").validator(Email).validator(short);
        field.set_value(" nobody-at-all ");
        assert_eq!(field.value(), "nobody-at-all");
        assert!(!field.validate());
        assert_eq!(
            field.errors(),
            &[
                "Email is not a valid email address".to_string(),
                "Email is too long".to_string(),
            ]
        );

        field.set_value("a@b.io");
        assert!(field.validate());
        assert!(field.errors().is_empty());
    }
}

//! Form state
//!
//! An explicit map from field name to its validator, current value and error.
//! Values are written directly; validation runs on demand and stores one
//! message per failing field. Field order follows the schema.

use std::fmt;

use indexmap::IndexMap;
use snapgram_core::validation::{Schema, SchemaInput, ValidationErrors};
use snapgram_core::{Credentials, NewUser, PostFields};

/// Checks one value, returning the error message on failure.
pub type FieldValidator = Box<dyn Fn(&str) -> Option<&'static str> + Send + Sync>;

/// One field: its validator, current value, default and stored error.
pub struct FieldState {
    validator: FieldValidator,
    value: String,
    default: String,
    error: Option<String>,
}

impl FieldState {
    /// Current value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Stored error, set by the last validation.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Re-run this field's validator against its current value.
    fn revalidate(&mut self) -> bool {
        self.error = (self.validator)(&self.value).map(str::to_string);
        self.error.is_none()
    }
}

impl fmt::Debug for FieldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldState")
            .field("value", &self.value)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// Values and errors for one form.
#[derive(Debug)]
pub struct FormState {
    schema: &'static Schema,
    fields: IndexMap<&'static str, FieldState>,
}

impl FormState {
    /// Empty form for `schema`.
    pub fn new(schema: &'static Schema) -> Self {
        let fields = schema
            .fields
            .iter()
            .map(|spec| {
                let name = spec.name;
                let validator: FieldValidator = Box::new(move |value: &str| schema.check_field(name, value));
                (
                    name,
                    FieldState {
                        validator,
                        value: String::new(),
                        default: String::new(),
                        error: None,
                    },
                )
            })
            .collect();
        Self { schema, fields }
    }

    /// Form with defaults; fields not named in `defaults` start empty.
    pub fn with_defaults<'a, I>(schema: &'static Schema, defaults: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        let mut form = Self::new(schema);
        for (name, value) in defaults {
            if let Some(field) = form.fields.get_mut(name) {
                field.default = value.clone();
                field.value = value;
            }
        }
        form
    }

    /// Schema the form was built from.
    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    /// Write a field. Clears its error. Returns false for unknown fields.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.fields.get_mut(name) {
            Some(field) => {
                field.value = value.into();
                field.error = None;
                true
            }
            None => false,
        }
    }

    /// Current value of `name`, if the schema has it.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(FieldState::value)
    }

    /// Stored error of `name`.
    pub fn error(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(FieldState::error)
    }

    /// Full state of `name`.
    pub fn field(&self, name: &str) -> Option<&FieldState> {
        self.fields.get(name)
    }

    /// Validate a single field, e.g. on blur.
    pub fn validate_field(&mut self, name: &str) -> bool {
        self.fields
            .get_mut(name)
            .map(FieldState::revalidate)
            .unwrap_or(false)
    }

    /// Validate every field, storing errors. Returns the collected errors,
    /// if any.
    pub fn validate(&mut self) -> Result<(), ValidationErrors> {
        let mut valid = true;
        for field in self.fields.values_mut() {
            valid &= field.revalidate();
        }
        if valid {
            return Ok(());
        }
        let result = snapgram_core::validate(self.schema, &*self);
        result.map(|_| ())
    }

    /// Replace stored errors with `errors`.
    pub fn apply_errors(&mut self, errors: &ValidationErrors) {
        for field in self.fields.values_mut() {
            field.error = None;
        }
        for error in errors.iter() {
            if let Some(field) = self.fields.get_mut(error.field.as_str()) {
                field.error = Some(error.message.clone());
            }
        }
    }

    /// Whether any field holds an error.
    pub fn has_errors(&self) -> bool {
        self.fields.values().any(|f| f.error.is_some())
    }

    /// Back to defaults, errors cleared.
    pub fn reset(&mut self) {
        for field in self.fields.values_mut() {
            field.value = field.default.clone();
            field.error = None;
        }
    }

    fn owned(&self, name: &str) -> String {
        self.value(name).unwrap_or_default().to_string()
    }

    /// Sign-in credentials from `email` and `password`.
    pub fn to_credentials(&self) -> Credentials {
        Credentials::new(self.owned("email"), self.owned("password"))
    }

    /// Sign-up input from the four sign-up fields.
    pub fn to_new_user(&self) -> NewUser {
        NewUser::new(
            self.owned("name"),
            self.owned("username"),
            self.owned("email"),
            self.owned("password"),
        )
    }

    /// Text fields of a post form; media is tracked by the caller.
    pub fn to_post_fields(&self) -> PostFields {
        PostFields {
            caption: self.owned("caption"),
            files: Vec::new(),
            location: self.owned("location"),
            tags: self.owned("tags"),
        }
    }
}

impl SchemaInput for FormState {
    fn field(&self, name: &str) -> Option<&str> {
        self.value(name)
    }
}

impl SchemaInput for &FormState {
    fn field(&self, name: &str) -> Option<&str> {
        self.value(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapgram_core::{POST, SIGN_IN, SIGN_UP};

    #[test]
    fn fields_follow_schema_order() {
        let form = FormState::new(&SIGN_UP);
        let ordered: Vec<_> = form.fields.keys().copied().collect();
        assert_eq!(ordered, ["name", "username", "email", "password"]);
    }

    #[test]
    fn validate_stores_errors_per_field() {
        let mut form = FormState::new(&SIGN_IN);
        form.set("email", "bad");
        form.set("password", "short");

        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(form.error("email").is_some());
        assert!(form.error("password").is_some());

        form.set("email", "al@x.com");
        assert_eq!(form.error("email"), None);
        assert!(form.has_errors());
    }

    #[test]
    fn valid_form_has_no_errors() {
        let mut form = FormState::new(&SIGN_IN);
        form.set("email", "al@x.com");
        form.set("password", "password1");
        assert!(form.validate().is_ok());
        assert!(!form.has_errors());
        assert_eq!(form.to_credentials(), Credentials::new("al@x.com", "password1"));
    }

    #[test]
    fn validate_field_only_touches_one_field() {
        let mut form = FormState::new(&SIGN_IN);
        assert!(!form.validate_field("email"));
        assert!(form.error("email").is_some());
        assert_eq!(form.error("password"), None);
        assert!(!form.validate_field("unknown"));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let mut form = FormState::new(&SIGN_IN);
        assert!(!form.set("avatar", "x"));
        assert_eq!(form.value("avatar"), None);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut form = FormState::with_defaults(
            &POST,
            [("caption", "Atardecer".to_string()), ("tags", "Arte,Humor".to_string())],
        );
        form.set("caption", "changed");
        form.set("location", "x");
        let _ = form.validate();
        form.reset();

        assert_eq!(form.value("caption"), Some("Atardecer"));
        assert_eq!(form.value("location"), Some(""));
        assert!(!form.has_errors());
        assert_eq!(form.to_post_fields().tags, "Arte,Humor");
    }

    #[test]
    fn apply_errors_replaces_previous_ones() {
        let mut form = FormState::new(&SIGN_IN);
        let _ = form.validate();
        assert!(form.error("password").is_some());

        let errors = snapgram_core::validate(&SIGN_IN, Credentials::new("bad", "password1"))
            .unwrap_err();
        form.apply_errors(&errors);
        assert!(form.error("email").is_some());
        assert_eq!(form.error("password"), None);
    }
}

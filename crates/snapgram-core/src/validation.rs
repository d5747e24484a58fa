//! Form validation schemas
//!
//! Each schema is a static table of per-field rules. Validation never panics:
//! any input, including one missing a field entirely, yields either a
//! [`Validated`] wrapper or a list of field-scoped [`ValidationError`]s in
//! schema order. At most one error is reported per field; the first failing
//! rule wins.
//!
//! ```rust
//! use snapgram_core::types::Credentials;
//! use snapgram_core::validation::{validate, SIGN_IN};
//!
//! let errors = validate(&SIGN_IN, Credentials::new("bad", "short")).unwrap_err();
//! assert_eq!(errors.len(), 2);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Deref;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{Credentials, NewUser, PostFields};

#[allow(clippy::expect_used)]
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9_'+\-]+(\.[A-Za-z0-9_'+\-]+)*@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$",
    )
    .expect("email pattern is a valid regex")
});

/// Message used when an input does not expose a field the schema names.
pub const MISSING_FIELD_MESSAGE: &str = "Campo requerido.";

// ============================================================================
// Rules
// ============================================================================

/// A single predicate over a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// At least this many characters.
    MinChars(usize),
    /// At most this many characters.
    MaxChars(usize),
    /// Well-formed email address.
    Email,
}

impl Rule {
    /// Lengths count Unicode scalar values, not bytes.
    pub fn check(&self, value: &str) -> bool {
        match self {
            Self::MinChars(min) => value.chars().count() >= *min,
            Self::MaxChars(max) => value.chars().count() <= *max,
            Self::Email => EMAIL_PATTERN.is_match(value),
        }
    }
}

/// Rule paired with the message shown when it fails.
#[derive(Debug, Clone, Copy)]
pub struct Constraint {
    /// Check applied to the value
    pub rule: Rule,
    /// Shown under the field
    pub message: &'static str,
}

const fn constraint(rule: Rule, message: &'static str) -> Constraint {
    Constraint { rule, message }
}

/// Rules for one named field. An empty rule list means "free-form".
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Field name as used by the form
    pub name: &'static str,
    /// Checked in order; the first failure wins
    pub constraints: &'static [Constraint],
}

/// Named set of field specs for one form.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    /// Display name
    pub name: &'static str,
    /// In display order
    pub fields: &'static [FieldSpec],
}

impl Schema {
    /// Look up the spec for `field`.
    pub fn field(&self, field: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == field)
    }

    /// Check one value against the rules for `field`.
    ///
    /// Returns the message of the first failing rule. Unknown fields pass.
    pub fn check_field(&self, field: &str, value: &str) -> Option<&'static str> {
        self.field(field)?
            .constraints
            .iter()
            .find(|c| !c.rule.check(value))
            .map(|c| c.message)
    }
}

// ============================================================================
// Schemas
// ============================================================================

const PASSWORD_MESSAGE: &str = "La contraseña debe tener al menos 8 caracteres.";
const EMAIL_MESSAGE: &str = "Correo electrónico inválido.";

/// Sign-up form.
pub static SIGN_UP: Schema = Schema {
    name: "sign-up",
    fields: &[
        FieldSpec {
            name: "name",
            constraints: &[constraint(Rule::MinChars(2), "Nombre muy corto.")],
        },
        FieldSpec {
            name: "username",
            constraints: &[constraint(Rule::MinChars(2), "Usuario muy corto.")],
        },
        FieldSpec {
            name: "email",
            constraints: &[constraint(Rule::Email, EMAIL_MESSAGE)],
        },
        FieldSpec {
            name: "password",
            constraints: &[constraint(Rule::MinChars(8), PASSWORD_MESSAGE)],
        },
    ],
};

/// Sign-in form.
pub static SIGN_IN: Schema = Schema {
    name: "sign-in",
    fields: &[
        FieldSpec {
            name: "email",
            constraints: &[constraint(Rule::Email, EMAIL_MESSAGE)],
        },
        FieldSpec {
            name: "password",
            constraints: &[constraint(Rule::MinChars(8), PASSWORD_MESSAGE)],
        },
    ],
};

/// Post create/edit form. The file list is not constrained here; format
/// checks belong to the media collaborator.
pub static POST: Schema = Schema {
    name: "post",
    fields: &[
        FieldSpec {
            name: "caption",
            constraints: &[
                constraint(Rule::MinChars(5), "La descripción debe tener al menos 5 caracteres."),
                constraint(Rule::MaxChars(2200), "La descripción no puede superar 2200 caracteres."),
            ],
        },
        FieldSpec {
            name: "location",
            constraints: &[
                constraint(Rule::MinChars(2), "La ubicación debe tener al menos 2 caracteres."),
                constraint(Rule::MaxChars(100), "La ubicación no puede superar 100 caracteres."),
            ],
        },
        FieldSpec {
            name: "tags",
            constraints: &[],
        },
    ],
};

// ============================================================================
// Errors
// ============================================================================

/// One field-level violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Field that failed
    pub field: String,
    /// Why it failed
    pub message: String,
}

impl ValidationError {
    /// Violation of `field` with `message`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Non-empty list of field violations, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Number of violating fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a value returned by [`validate`].
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Violations in schema order.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// Message for `field`, if it failed.
    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Take the violations.
    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.iter().map(|e| e.field.as_str()).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// Anything a schema can read named string fields from.
pub trait SchemaInput {
    /// Value of `name`, or `None` if the input has no such field.
    fn field(&self, name: &str) -> Option<&str>;
}

impl SchemaInput for Credentials {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "email" => Some(&self.email),
            "password" => Some(&self.password),
            _ => None,
        }
    }
}

impl SchemaInput for NewUser {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(&self.name),
            "username" => Some(&self.username),
            "email" => Some(&self.email),
            "password" => Some(&self.password),
            _ => None,
        }
    }
}

impl SchemaInput for PostFields {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "caption" => Some(&self.caption),
            "location" => Some(&self.location),
            "tags" => Some(&self.tags),
            _ => None,
        }
    }
}

impl SchemaInput for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl SchemaInput for BTreeMap<String, String> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Input that passed its schema. Only obtainable through [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated<T> {
    inner: T,
    schema: &'static str,
}

impl<T> Validated<T> {
    /// Name of the schema the value passed.
    pub fn schema(&self) -> &'static str {
        self.schema
    }

    /// Take the validated value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

/// Collect every field violation of `input` against `schema`.
pub fn violations<T: SchemaInput + ?Sized>(schema: &Schema, input: &T) -> Vec<ValidationError> {
    schema
        .fields
        .iter()
        .filter_map(|spec| match input.field(spec.name) {
            None => Some(ValidationError::new(spec.name, MISSING_FIELD_MESSAGE)),
            Some(value) => schema
                .check_field(spec.name, value)
                .map(|message| ValidationError::new(spec.name, message)),
        })
        .collect()
}

/// Validate `input` against `schema`.
pub fn validate<T: SchemaInput>(
    schema: &'static Schema,
    input: T,
) -> Result<Validated<T>, ValidationErrors> {
    let errors = violations(schema, &input);
    if errors.is_empty() {
        Ok(Validated {
            inner: input,
            schema: schema.name,
        })
    } else {
        Err(ValidationErrors(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_post() -> PostFields {
        PostFields {
            caption: "Atardecer en el muelle".into(),
            files: Vec::new(),
            location: "Valparaíso".into(),
            tags: "Arte, Humor".into(),
        }
    }

    #[test]
    fn sign_up_accepts_minimal_valid_user() {
        let user = NewUser::new("Al", "al", "al@x.com", "password1");
        let validated = validate(&SIGN_UP, user).unwrap();
        assert_eq!(validated.schema(), "sign-up");
        assert_eq!(validated.username, "al");
    }

    #[test]
    fn sign_up_reports_each_field_once_in_order() {
        let user = NewUser::new("A", "", "nope", "1234567");
        let errors = validate(&SIGN_UP, user).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["name", "username", "email", "password"]);
        assert_eq!(errors.for_field("name"), Some("Nombre muy corto."));
        assert_eq!(errors.for_field("username"), Some("Usuario muy corto."));
    }

    #[test]
    fn sign_in_rejects_bad_email_and_short_password() {
        let errors = validate(&SIGN_IN, Credentials::new("bad", "short")).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.for_field("email"), Some(EMAIL_MESSAGE));
        assert_eq!(errors.for_field("password"), Some(PASSWORD_MESSAGE));
    }

    #[test]
    fn email_rule_shapes() {
        for ok in ["al@x.com", "first.last+tag@mail.example.org", "a_b@d-omain.io"] {
            assert!(Rule::Email.check(ok), "{ok} should pass");
        }
        for bad in ["", "bad", "@x.com", "al@", "al@x", "al@@x.com", ".al@x.com", "al..b@x.com", "al @x.com"] {
            assert!(!Rule::Email.check(bad), "{bad} should fail");
        }
    }

    #[test]
    fn post_caption_bounds() {
        let mut post = valid_post();
        post.caption = "abcd".into();
        assert!(validate(&POST, post.clone()).is_err());

        post.caption = "abcde".into();
        assert!(validate(&POST, post.clone()).is_ok());

        post.caption = "x".repeat(2200);
        assert!(validate(&POST, post.clone()).is_ok());

        post.caption = "x".repeat(2201);
        let errors = validate(&POST, post).unwrap_err();
        assert_eq!(
            errors.for_field("caption"),
            Some("La descripción no puede superar 2200 caracteres.")
        );
    }

    #[test]
    fn post_location_bounds_count_characters_not_bytes() {
        let mut post = valid_post();
        // two scalar values, four bytes
        post.location = "ñá".into();
        assert!(validate(&POST, post.clone()).is_ok());

        post.location = "ñ".into();
        assert!(validate(&POST, post.clone()).is_err());

        post.location = "ü".repeat(101);
        assert!(validate(&POST, post).is_err());
    }

    #[test]
    fn tags_are_free_form() {
        let mut post = valid_post();
        post.tags = String::new();
        assert!(validate(&POST, post.clone()).is_ok());
        post.tags = ",,,".into();
        assert!(validate(&POST, post).is_ok());
    }

    #[test]
    fn missing_fields_are_reported_not_panicked() {
        let mut input = HashMap::new();
        input.insert("email".to_string(), "al@x.com".to_string());
        let errors = validate(&SIGN_IN, input).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.for_field("password"), Some(MISSING_FIELD_MESSAGE));
    }

    #[test]
    fn check_field_ignores_unknown_fields() {
        assert_eq!(SIGN_IN.check_field("avatar", ""), None);
        assert_eq!(SIGN_IN.check_field("password", "short"), Some(PASSWORD_MESSAGE));
    }
}

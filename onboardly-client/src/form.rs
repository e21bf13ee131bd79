/// Form input state
///
/// A [`FormState`] holds one entry per field id. Every input re-runs that
/// field's validators and recomputes the aggregate validity, so `is_valid`
/// is always current after the call returns.

use std::collections::BTreeMap;

use crate::validator::{validate, Validator};

/// Current value of one field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    pub value: String,
    pub is_valid: bool,
}

#[derive(Debug, Clone)]
struct Field {
    state: FieldState,
    validators: Vec<Validator>,
}

/// All fields of a form plus their aggregate validity
#[derive(Debug, Clone, Default)]
pub struct FormState {
    fields: BTreeMap<String, Field>,
    is_valid: bool,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty field; its initial validity is what its validators say
    /// about the empty string
    pub fn with_field(mut self, id: impl Into<String>, validators: Vec<Validator>) -> Self {
        let is_valid = validate("", &validators);
        self.fields.insert(
            id.into(),
            Field {
                state: FieldState {
                    value: String::new(),
                    is_valid,
                },
                validators,
            },
        );
        self.recompute();
        self
    }

    /// Records new input; returns the field's validity, or None for an
    /// unknown field id
    pub fn input(&mut self, id: &str, value: impl Into<String>) -> Option<bool> {
        let field = self.fields.get_mut(id)?;
        field.state.value = value.into();
        field.state.is_valid = validate(&field.state.value, &field.validators);
        let is_valid = field.state.is_valid;

        self.recompute();
        Some(is_valid)
    }

    pub fn field(&self, id: &str) -> Option<&FieldState> {
        self.fields.get(id).map(|f| &f.state)
    }

    /// Value of `id`, or "" for an unknown field
    pub fn value(&self, id: &str) -> &str {
        self.field(id).map(|f| f.value.as_str()).unwrap_or("")
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    fn recompute(&mut self) {
        self.is_valid = self.fields.values().all(|f| f.state.is_valid);
    }
}

/// Popup shown after a failed submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPopup {
    pub title: String,
    pub message: String,
}

/// Where a submitting form is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmitState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed(ErrorPopup),
}

impl SubmitState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmitState::Submitting)
    }

    pub fn popup(&self) -> Option<&ErrorPopup> {
        match self {
            SubmitState::Failed(popup) => Some(popup),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_form() -> FormState {
        FormState::new()
            .with_field("email", vec![Validator::Email])
            .with_field("password", vec![Validator::MinLength(6)])
    }

    #[test]
    fn test_new_form_is_invalid() {
        let form = login_form();
        assert!(!form.is_valid());
        assert_eq!(form.value("email"), "");
        assert!(!form.field("password").unwrap().is_valid);
    }

    #[test]
    fn test_validity_tracks_every_input() {
        let mut form = login_form();

        assert_eq!(form.input("email", "a@b.com"), Some(true));
        assert!(!form.is_valid());

        assert_eq!(form.input("password", "secret1"), Some(true));
        assert!(form.is_valid());

        assert_eq!(form.input("password", "short"), Some(false));
        assert!(!form.is_valid());
    }

    #[test]
    fn test_unknown_field_is_ignored() {
        let mut form = login_form();
        assert_eq!(form.input("phone", "123"), None);
        assert!(form.field("phone").is_none());
    }

    #[test]
    fn test_optional_field_starts_valid() {
        let form = FormState::new().with_field("name", vec![Validator::MaxLength(255)]);
        assert!(form.is_valid());
    }
}

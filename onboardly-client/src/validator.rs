/// Field validators run on every keystroke
///
/// Lengths count characters of the value as typed, the way the server counts
/// passwords; only `Require` ignores surrounding whitespace. `Email` is the
/// same rule the server applies to login and registration bodies.

use ::validator::ValidateEmail;

/// A single rule a field value must satisfy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Validator {
    /// Not blank
    Require,

    /// At least this many characters
    MinLength(usize),

    /// At most this many characters
    MaxLength(usize),

    /// Numeric value not below
    Min(f64),

    /// Numeric value not above
    Max(f64),

    Email,
}

impl Validator {
    pub fn check(&self, value: &str) -> bool {
        let trimmed = value.trim();
        match *self {
            Validator::Require => !trimmed.is_empty(),
            Validator::MinLength(min) => value.chars().count() >= min,
            Validator::MaxLength(max) => value.chars().count() <= max,
            Validator::Min(min) => trimmed.parse::<f64>().map(|n| n >= min).unwrap_or(false),
            Validator::Max(max) => trimmed.parse::<f64>().map(|n| n <= max).unwrap_or(false),
            Validator::Email => trimmed.validate_email(),
        }
    }
}

/// Whether `value` passes every validator
pub fn validate(value: &str, validators: &[Validator]) -> bool {
    validators.iter().all(|v| v.check(value))
}

//! Form-validation helpers shared by every workflow.
//!
//! Checks accumulate into [`FieldErrors`] so a caller sees every problem with a submitted
//! form at once instead of fixing them one round trip at a time.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// A single failed check on a named form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Collected validation failures for one submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }

    /// Record `message` when the trimmed value is empty. Returns whether the value is present.
    pub fn require(&mut self, field: &'static str, value: &str, message: &str) -> bool {
        if value.trim().is_empty() {
            self.push(field, message);
            false
        } else {
            true
        }
    }

    /// Character-count bounds; `max` of `None` leaves the upper end open.
    pub fn check_length(
        &mut self,
        field: &'static str,
        value: &str,
        min: usize,
        max: Option<usize>,
        message: &str,
    ) {
        let count = value.chars().count();
        let too_long = max.is_some_and(|max| count > max);
        if count < min || too_long {
            self.push(field, message);
        }
    }

    pub fn check_email(&mut self, field: &'static str, value: &str) {
        if !email_pattern().is_match(value) {
            self.push(field, "Please enter a valid email address");
        }
    }

    pub fn check_hex_color(&mut self, field: &'static str, value: &str) {
        if !hex_color_pattern().is_match(value) {
            self.push(field, "Color must be a valid hex code (e.g., #3498db)");
        }
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "invalid input");
        }
        let joined = self
            .errors
            .iter()
            .map(|error| format!("{}: {}", error.field, error.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{joined}")
    }
}

impl std::error::Error for FieldErrors {}

/// Trim an optional free-text field, treating blank input as absent.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("static email pattern"))
}

fn hex_color_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("static color pattern"))
}

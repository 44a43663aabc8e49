//! Request field validation.
//!
//! Input types collect every failing field into a [`Validator`] and turn it
//! into a single [`Error::Validation`] so clients see all problems at once.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, FieldError, Result};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
        .expect("email pattern is valid")
});

/// A number that may arrive as a JSON number or as a string.
///
/// Form posts and multipart uploads send everything as text, so numeric
/// fields accept both.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    /// An integral JSON number.
    Int(i64),
    /// A JSON number with a fractional part or exponent.
    Float(f64),
    /// A string holding a number.
    Text(String),
}

impl Numeric {
    /// Interpret the value as a whole number.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(*f as i64),
            Self::Float(_) => None,
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<i64> for Numeric {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

/// Accumulates field errors for one request.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    /// Create an empty validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field`.
    pub fn fail(&mut self, field: &str, msg: &str) {
        self.errors.push(FieldError::body(field, msg));
    }

    /// Record a failure for `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, msg: &str) {
        if !ok {
            self.fail(field, msg);
        }
    }

    /// Require a non-blank string, returning it trimmed.
    pub fn required(&mut self, field: &str, value: Option<&str>, msg: &str) -> Option<String> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(v.to_string()),
            _ => {
                self.fail(field, msg);
                None
            }
        }
    }

    /// Validate an optional string: absent is fine, present must be non-blank.
    pub fn optional(&mut self, field: &str, value: Option<&str>, msg: &str) -> Option<String> {
        value.and_then(|v| self.required(field, Some(v), msg))
    }

    /// Require a syntactically valid email, returning it normalized.
    pub fn email(&mut self, field: &str, value: Option<&str>, msg: &str) -> Option<String> {
        match value {
            Some(v) if is_valid_email(v.trim()) => Some(normalize_email(v)),
            _ => {
                self.fail(field, msg);
                None
            }
        }
    }

    /// Require a string of at least `min` characters. The value is not trimmed.
    pub fn min_len(
        &mut self,
        field: &str,
        value: Option<&str>,
        min: usize,
        msg: &str,
    ) -> Option<String> {
        match value {
            Some(v) if v.chars().count() >= min => Some(v.to_string()),
            _ => {
                self.fail(field, msg);
                None
            }
        }
    }

    /// Require a whole number no smaller than `min`.
    pub fn integer(
        &mut self,
        field: &str,
        value: Option<&Numeric>,
        min: i64,
        msg: &str,
    ) -> Option<i64> {
        match value.and_then(Numeric::as_i64) {
            Some(n) if n >= min => Some(n),
            _ => {
                self.fail(field, msg);
                None
            }
        }
    }

    /// Require a whole number inside `range`.
    pub fn integer_in(
        &mut self,
        field: &str,
        value: Option<&Numeric>,
        range: std::ops::RangeInclusive<i64>,
        msg: &str,
    ) -> Option<i64> {
        match value.and_then(Numeric::as_i64) {
            Some(n) if range.contains(&n) => Some(n),
            _ => {
                self.fail(field, msg);
                None
            }
        }
    }

    /// Whether no failures were recorded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Finish validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] carrying every recorded failure.
    pub fn finish(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self.errors))
        }
    }
}

/// Check whether `email` looks like a deliverable address.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_PATTERN.is_match(email)
}

/// Canonical form used for storage and lookup.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Escape HTML-significant characters.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(ch),
        }
    }
    out
}

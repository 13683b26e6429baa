//! Field constraints for person and user records.
//!
//! Both store backends run these checks before writing, so the same input
//! fails the same way whichever backend is configured. Messages follow the
//! `"<Entity> validation failed: <field>: <reason>"` shape clients already
//! display.

use crate::models::{NewPerson, Person};
use serde::Serialize;
use std::fmt;

/// Minimum length of `name`, `phone`, `street` and `city`
pub const MIN_PERSON_FIELD_LEN: usize = 5;

pub const PERSON: &str = "Person";
pub const USER: &str = "User";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ViolationKind {
    Required,
    MinLength { min: usize },
    Unique,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub value: Option<String>,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl FieldViolation {
    pub fn unique(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: Some(value.to_string()),
            kind: ViolationKind::Unique,
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.value.as_deref().unwrap_or_default();
        match &self.kind {
            ViolationKind::Required => write!(f, "Path `{}` is required.", self.field),
            ViolationKind::MinLength { min } => write!(
                f,
                "Path `{}` (`{}`) is shorter than the minimum allowed length ({}).",
                self.field, value, min
            ),
            ViolationKind::Unique => write!(
                f,
                "Error, expected `{}` to be unique. Value: `{}`",
                self.field, value
            ),
        }
    }
}

/// Rejected write, carrying the offending input for client display
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub entity: &'static str,
    pub violations: Vec<FieldViolation>,
    pub invalid_args: serde_json::Value,
}

impl ValidationError {
    pub fn unique(
        entity: &'static str,
        field: &'static str,
        value: &str,
        invalid_args: serde_json::Value,
    ) -> Self {
        Self {
            entity,
            violations: vec![FieldViolation::unique(field, value)],
            invalid_args,
        }
    }

    pub fn invalid_fields(&self) -> Vec<&'static str> {
        let mut fields: Vec<&'static str> = Vec::with_capacity(self.violations.len());
        for v in &self.violations {
            if !fields.contains(&v.field) {
                fields.push(v.field);
            }
        }
        fields
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation failed: ", self.entity)?;
        let reasons = self
            .violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v))
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&reasons)
    }
}

impl std::error::Error for ValidationError {}

/// Accumulates violations for one record
#[derive(Debug, Default)]
pub struct Checks {
    violations: Vec<FieldViolation>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(&mut self, field: &'static str, value: &str) -> &mut Self {
        if value.is_empty() {
            self.violations.push(FieldViolation {
                field,
                value: None,
                kind: ViolationKind::Required,
            });
        }
        self
    }

    pub fn min_len(&mut self, field: &'static str, value: Option<&str>, min: usize) -> &mut Self {
        if let Some(value) = value {
            if !value.is_empty() && value.chars().count() < min {
                self.violations.push(FieldViolation {
                    field,
                    value: Some(value.to_string()),
                    kind: ViolationKind::MinLength { min },
                });
            }
        }
        self
    }

    /// Optional fields may be absent but an empty value is still too short.
    pub fn optional_min_len(
        &mut self,
        field: &'static str,
        value: Option<&str>,
        min: usize,
    ) -> &mut Self {
        if value.is_some_and(str::is_empty) {
            self.violations.push(FieldViolation {
                field,
                value: Some(String::new()),
                kind: ViolationKind::MinLength { min },
            });
            return self;
        }
        self.min_len(field, value, min)
    }

    pub fn push(&mut self, violation: FieldViolation) -> &mut Self {
        self.violations.push(violation);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn finish(
        self,
        entity: &'static str,
        invalid_args: impl FnOnce() -> serde_json::Value,
    ) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            return Ok(());
        }
        Err(ValidationError {
            entity,
            violations: self.violations,
            invalid_args: invalid_args(),
        })
    }
}

fn person_checks(name: &str, phone: Option<&str>, street: &str, city: &str) -> Checks {
    let mut checks = Checks::new();
    checks
        .required("name", name)
        .min_len("name", Some(name), MIN_PERSON_FIELD_LEN)
        .optional_min_len("phone", phone, MIN_PERSON_FIELD_LEN)
        .required("street", street)
        .min_len("street", Some(street), MIN_PERSON_FIELD_LEN)
        .required("city", city)
        .min_len("city", Some(city), MIN_PERSON_FIELD_LEN);
    checks
}

/// Field checks for a new person, uniqueness excluded.
pub fn new_person_checks(fields: &NewPerson) -> Checks {
    person_checks(
        &fields.name,
        fields.phone.as_deref(),
        &fields.street,
        &fields.city,
    )
}

/// Re-validation of a stored person before it is saved again.
pub fn validate_person(person: &Person) -> Result<(), ValidationError> {
    person_checks(
        &person.name,
        person.phone.as_deref(),
        &person.street,
        &person.city,
    )
    .finish(PERSON, || to_args(person))
}

pub fn username_checks(username: &str) -> Checks {
    let mut checks = Checks::new();
    checks.required("username", username);
    checks
}

pub fn to_args<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

pub fn username_args(username: &str) -> serde_json::Value {
    serde_json::json!({ "username": username })
}

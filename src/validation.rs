use std::{borrow::Cow, collections::BTreeMap, sync::LazyLock};

use regex::Regex;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

pub static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern"));

pub static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern"));

/// Usernames that collide with fixed route segments.
pub const RESERVED_USERNAMES: &[&str] = &["me"];

/// Field name to list of human-readable messages, rendered as the 400 body.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

pub fn validate_not_reserved(username: &str) -> Result<(), ValidationError> {
    if RESERVED_USERNAMES.contains(&username) {
        return Err(ValidationError::new("reserved_username")
            .with_message(Cow::Owned(format!("Username '{username}' is reserved."))));
    }
    Ok(())
}

pub fn validate_year(year: i32) -> Result<(), ValidationError> {
    if year > current_year() {
        return Err(ValidationError::new("future_year")
            .with_message(Cow::Borrowed("Year must not be later than the current year.")));
    }
    Ok(())
}

pub fn current_year() -> i32 {
    let today: jiff::civil::Date = jiff::Zoned::now().into();
    i32::from(today.year())
}

pub fn field_error(field: &str, message: impl Into<String>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.insert(field.to_string(), vec![message.into()]);
    errors
}

/// Flattens `validator` output into the `{field: [messages]}` shape.
pub fn flatten(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, kind) in errors.errors() {
        let messages = match kind {
            ValidationErrorsKind::Field(errs) => errs.iter().map(describe).collect(),
            ValidationErrorsKind::Struct(nested) => {
                flatten(nested).into_values().flatten().collect()
            },
            ValidationErrorsKind::List(items) => items
                .values()
                .flat_map(|nested| flatten(nested).into_values().flatten())
                .collect(),
        };
        out.insert(field.to_string(), messages);
    }
    out
}

fn describe(err: &ValidationError) -> String {
    match &err.message {
        Some(msg) => msg.to_string(),
        None => format!("Invalid value ({}).", err.code),
    }
}

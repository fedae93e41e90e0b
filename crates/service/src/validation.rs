//! Custom rules for `#[derive(Validate)]` inputs and the bridge into [`FieldErrors`].

use std::borrow::Cow;

use models::user::Role;
use rust_decimal::Decimal;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::errors::{FieldErrors, ServiceError};

/// `NUMERIC(10, 2)` holds at most eight integer digits.
const PRICE_CEILING: u64 = 100_000_000;

fn error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("blank", "This field may not be blank."));
    }
    Ok(())
}

/// Non-negative, at most two decimal places, fits `NUMERIC(10, 2)`.
pub fn price_fits(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(error("min_value", "Ensure this value is greater than or equal to 0."));
    }
    if price.normalize().scale() > 2 {
        return Err(error("max_decimal_places", "Ensure that there are no more than 2 decimal places."));
    }
    if *price >= Decimal::from(PRICE_CEILING) {
        return Err(error("max_digits", "Ensure that there are no more than 10 digits in total."));
    }
    Ok(())
}

/// Blank means the default role; admins are never self-registered.
pub fn registrable_role(raw: &str) -> Result<(), ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(());
    }
    match raw.parse::<Role>() {
        Ok(Role::Admin) => Err(error("admin_role", "Cannot register as admin.")),
        Ok(_) => Ok(()),
        Err(_) => Err(error("invalid_choice", format!("\"{raw}\" is not a valid choice."))),
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            for e in errs.iter() {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({}).", e.code));
                out.add(field.as_ref(), message);
            }
        }
        out
    }
}

/// Run the derived rules; the field-keyed messages (possibly empty) are handed back.
pub fn field_errors<T: Validate>(input: &T) -> FieldErrors {
    input.validate().map(|()| FieldErrors::new()).unwrap_or_else(FieldErrors::from)
}

/// Run the derived rules, failing with a `Validation` error on any violation.
pub fn validate<T: Validate>(input: &T) -> Result<(), ServiceError> {
    field_errors(input).into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_rules() {
        assert!(price_fits(&Decimal::new(4999, 2)).is_ok());
        assert!(price_fits(&Decimal::ZERO).is_ok());
        assert!(price_fits(&Decimal::new(-1, 0)).is_err());
        assert!(price_fits(&Decimal::new(10001, 3)).is_err());
        assert!(price_fits(&Decimal::new(100_000_000, 0)).is_err());
        // trailing zeros do not count as precision
        assert!(price_fits(&Decimal::new(19900, 3)).is_ok());
    }

    #[test]
    fn role_rules() {
        assert!(registrable_role("student").is_ok());
        assert!(registrable_role("instructor").is_ok());
        assert!(registrable_role("  ").is_ok());
        let admin = registrable_role("admin").unwrap_err();
        assert_eq!(admin.message.as_deref(), Some("Cannot register as admin."));
        let unknown = registrable_role("tutor").unwrap_err();
        assert_eq!(unknown.message.as_deref(), Some("\"tutor\" is not a valid choice."));
    }

    #[test]
    fn blank_means_whitespace_only() {
        assert!(not_blank("x").is_ok());
        assert!(not_blank(" \t").is_err());
    }

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 2, message = "too short"), custom(function = "not_blank"))]
        name: String,
        #[validate(range(min = 1, max = 5))]
        score: i16,
    }

    #[test]
    fn violations_become_field_keyed_messages() {
        let errors = field_errors(&Sample { name: " ".into(), score: 9 });
        let name = errors.get("name").unwrap();
        assert!(name.contains(&"too short".to_string()));
        assert!(name.contains(&"This field may not be blank.".to_string()));
        assert_eq!(errors.get("score").unwrap().len(), 1);
        assert!(field_errors(&Sample { name: "ok".into(), score: 3 }).is_empty());
    }
}

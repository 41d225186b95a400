//! Overflow-checked `Decimal` arithmetic.
//!
//! The `Decimal` operators panic when a result leaves the 96-bit range, which
//! extreme but in-domain inputs can reach.

use fin_core::ValidationError;
use rust_decimal::Decimal;

pub(crate) fn mul(
    quantity: &'static str,
    a: Decimal,
    b: Decimal,
) -> Result<Decimal, ValidationError> {
    a.checked_mul(b).ok_or(ValidationError::Overflow { quantity })
}

pub(crate) fn div(
    quantity: &'static str,
    a: Decimal,
    b: Decimal,
) -> Result<Decimal, ValidationError> {
    a.checked_div(b).ok_or(ValidationError::Overflow { quantity })
}

pub(crate) fn add(
    quantity: &'static str,
    a: Decimal,
    b: Decimal,
) -> Result<Decimal, ValidationError> {
    a.checked_add(b).ok_or(ValidationError::Overflow { quantity })
}

pub(crate) fn sub(
    quantity: &'static str,
    a: Decimal,
    b: Decimal,
) -> Result<Decimal, ValidationError> {
    a.checked_sub(b).ok_or(ValidationError::Overflow { quantity })
}

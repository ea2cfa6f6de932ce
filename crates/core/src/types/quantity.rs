//! Cart line-item quantity.
//!
//! A line item that exists always holds a strictly positive quantity; a
//! quantity of zero means "no line item" and is never stored.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative where a positive quantity is required.
    #[error("quantity must be greater than zero (got {0})")]
    NotPositive(i64),
    /// Negative where zero or more is allowed.
    #[error("quantity cannot be negative (got {0})")]
    Negative(i64),
    /// Exceeds what a line item can store.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Largest storable quantity.
        max: u32,
    },
}

/// A strictly positive line-item quantity.
///
/// Bounded by [`Quantity::MAX`] so it always fits the `INTEGER` column that
/// stores it.
///
/// ```
/// use marketplace_core::Quantity;
///
/// let two = Quantity::positive(2).unwrap();
/// let three = Quantity::positive(3).unwrap();
/// assert_eq!(two.checked_add(three).unwrap().get(), 5);
///
/// assert!(Quantity::positive(0).is_err());
/// assert_eq!(Quantity::non_negative(0).unwrap(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// Largest quantity a single line item can hold (`i32::MAX`).
    pub const MAX: u32 = i32::MAX.unsigned_abs();

    /// Build a quantity that must be strictly positive.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::NotPositive`] for zero or negative input and
    /// [`QuantityError::TooLarge`] above [`Quantity::MAX`].
    pub fn positive(value: i64) -> Result<Self, QuantityError> {
        if value <= 0 {
            return Err(QuantityError::NotPositive(value));
        }
        Self::bounded(value)
    }

    /// Build an optional quantity where zero means "none".
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::Negative`] for negative input and
    /// [`QuantityError::TooLarge`] above [`Quantity::MAX`].
    pub fn non_negative(value: i64) -> Result<Option<Self>, QuantityError> {
        match value {
            v if v < 0 => Err(QuantityError::Negative(v)),
            0 => Ok(None),
            v => Self::bounded(v).map(Some),
        }
    }

    fn bounded(value: i64) -> Result<Self, QuantityError> {
        u32::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(QuantityError::TooLarge { max: Self::MAX })
    }

    /// Merge two quantities, as repeated additions of the same product do.
    ///
    /// Returns `None` if the sum would exceed [`Quantity::MAX`].
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0
            .get()
            .checked_add(other.0.get())
            .filter(|sum| *sum <= Self::MAX)
            .and_then(NonZeroU32::new)
            .map(Self)
    }

    /// The quantity as an unsigned integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// The quantity as the `i32` stored in the database.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        // Bounded by `MAX` on construction.
        i32::try_from(self.0.get()).unwrap_or(i32::MAX)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::positive(value)
    }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::positive(i64::from(value))
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_rejects_zero_and_negative() {
        assert_eq!(Quantity::positive(0), Err(QuantityError::NotPositive(0)));
        assert_eq!(Quantity::positive(-1), Err(QuantityError::NotPositive(-1)));
    }

    #[test]
    fn test_positive_upper_bound() {
        assert_eq!(Quantity::positive(i64::from(i32::MAX)).unwrap().get(), Quantity::MAX);
        assert_eq!(
            Quantity::positive(i64::from(i32::MAX) + 1),
            Err(QuantityError::TooLarge { max: Quantity::MAX })
        );
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(Quantity::non_negative(0), Ok(None));
        assert_eq!(Quantity::non_negative(4).unwrap().unwrap().get(), 4);
        assert_eq!(Quantity::non_negative(-2), Err(QuantityError::Negative(-2)));
    }

    #[test]
    fn test_checked_add_merges() {
        let merged = Quantity::positive(2)
            .unwrap()
            .checked_add(Quantity::positive(3).unwrap())
            .unwrap();
        assert_eq!(merged.get(), 5);
    }

    #[test]
    fn test_checked_add_overflow() {
        let max = Quantity::positive(i64::from(i32::MAX)).unwrap();
        assert!(max.checked_add(Quantity::positive(1).unwrap()).is_none());
    }

    #[test]
    fn test_as_i32() {
        assert_eq!(Quantity::positive(9).unwrap().as_i32(), 9);
    }

    #[test]
    fn test_serde() {
        let q: Quantity = serde_json::from_str("5").unwrap();
        assert_eq!(q.get(), 5);
        assert_eq!(serde_json::to_string(&q).unwrap(), "5");
        assert!(serde_json::from_str::<Quantity>("0").is_err());
    }
}

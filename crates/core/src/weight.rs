use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Share of a statement's outflows attributed to the person running the
/// analysis. Always strictly positive; values above one are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Weight(Decimal);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeightError {
    #[error("weight '{0}' is not a decimal number")]
    NotANumber(String),
    #[error("weight {0} must be greater than zero")]
    NotPositive(Decimal),
}

impl Weight {
    pub const ONE: Weight = Weight(Decimal::ONE);

    pub fn new(value: Decimal) -> Result<Self, WeightError> {
        if value <= Decimal::ZERO {
            return Err(WeightError::NotPositive(value));
        }
        Ok(Weight(value))
    }

    /// Parse a multiplier as written in a file name. Accepts either `.` or
    /// `,` as the decimal separator (`0.5`, `0,5`).
    pub fn parse(raw: &str) -> Result<Self, WeightError> {
        let normalized = raw.trim().replace(',', ".");
        let value = Decimal::from_str(&normalized)
            .map_err(|_| WeightError::NotANumber(raw.to_string()))?;
        Weight::new(value)
    }

    pub fn value(self) -> Decimal {
        self.0
    }

    pub fn is_one(self) -> bool {
        self.0 == Decimal::ONE
    }
}

impl Default for Weight {
    fn default() -> Self {
        Weight::ONE
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl TryFrom<Decimal> for Weight {
    type Error = WeightError;
    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Weight::new(value)
    }
}

impl From<Weight> for Decimal {
    fn from(w: Weight) -> Decimal {
        w.0
    }
}

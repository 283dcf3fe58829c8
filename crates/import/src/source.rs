use outflow_core::{Weight, WeightError};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// A statement file name split into its weight prefix and logical name.
///
/// `0.5x_joint.csv` is the `joint.csv` source counted at half weight;
/// `account.csv` has no prefix and counts in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceName {
    pub weight: Weight,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid weight prefix '{raw}': {reason}")]
pub struct InvalidPrefix {
    pub raw: String,
    pub reason: WeightError,
}

fn prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<raw>[-+]?[0-9.,]+)x_(?P<rest>.+)$").expect("weight prefix pattern is valid")
    })
}

impl SourceName {
    pub fn parse(file_name: &str) -> Result<Self, InvalidPrefix> {
        let Some(caps) = prefix_re().captures(file_name) else {
            return Ok(SourceName { weight: Weight::ONE, name: file_name.to_string() });
        };
        let raw = &caps["raw"];
        let weight = Weight::parse(raw).map_err(|reason| InvalidPrefix {
            raw: raw.to_string(),
            reason,
        })?;
        Ok(SourceName { weight, name: caps["rest"].to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn half_weight_prefix() {
        let s = SourceName::parse("0.5x_joint.csv").unwrap();
        assert_eq!(s.weight.value(), Decimal::new(5, 1));
        assert_eq!(s.name, "joint.csv");
    }

    #[test]
    fn no_prefix_means_full_weight() {
        let s = SourceName::parse("account.csv").unwrap();
        assert_eq!(s.weight, Weight::ONE);
        assert_eq!(s.name, "account.csv");
    }

    #[test]
    fn weights_above_one_are_accepted() {
        let s = SourceName::parse("2x_business.csv").unwrap();
        assert_eq!(s.weight.value(), Decimal::from(2));
        assert_eq!(s.name, "business.csv");
    }

    #[test]
    fn comma_weight() {
        let s = SourceName::parse("0,25x_flat.CSV").unwrap();
        assert_eq!(s.weight.value(), Decimal::new(25, 2));
    }

    #[test]
    fn non_positive_prefix_is_rejected() {
        let err = SourceName::parse("0x_joint.csv").unwrap_err();
        assert_eq!(err.raw, "0");
        assert!(matches!(err.reason, WeightError::NotPositive(_)));
        assert!(SourceName::parse("-1x_joint.csv").is_err());
    }

    #[test]
    fn garbled_prefix_is_rejected() {
        let err = SourceName::parse("1.2.3x_joint.csv").unwrap_err();
        assert_eq!(err.raw, "1.2.3");
        assert!(matches!(err.reason, WeightError::NotANumber(_)));
    }

    #[test]
    fn words_ending_in_x_are_not_prefixes() {
        let s = SourceName::parse("box_receipts.csv").unwrap();
        assert_eq!(s.weight, Weight::ONE);
        assert_eq!(s.name, "box_receipts.csv");
    }
}

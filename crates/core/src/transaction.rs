use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::money::Money;
use super::weight::Weight;

/// One decoded statement row.
///
/// Built once by the record decoder and only read afterwards: the
/// categorizer looks at its text, the aggregator at its amount and weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub beneficiary: String,
    pub amount: Money,
    pub currency: String,
    pub transaction_type: String,
    pub weight: Weight,
    /// Logical source name: the file name without its weight prefix.
    pub source: String,
    /// 1-based line number in the decoded source file.
    pub row: usize,
}

impl Transaction {
    /// Returns the same transaction attributed with `weight`.
    pub fn with_weight(self, weight: Weight) -> Self {
        Transaction { weight, ..self }
    }

    pub fn is_outflow(&self) -> bool {
        self.amount.is_outflow()
    }

    /// `|amount| * weight` for outflows, `None` for inflows and zero rows.
    pub fn weighted_outflow(&self) -> Option<Money> {
        self.is_outflow().then(|| self.amount.abs() * self.weight)
    }

    /// Lower-cased searchable text: description, beneficiary and type joined
    /// by single spaces.
    pub fn haystack(&self) -> String {
        format!(
            "{} {} {}",
            self.description.to_lowercase(),
            self.beneficiary.to_lowercase(),
            self.transaction_type.to_lowercase()
        )
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::tx;
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn weighted_outflow_applies_weight() {
        let half = Weight::new(Decimal::new(5, 1)).unwrap();
        let t = tx("Miete", -80000).with_weight(half);
        assert_eq!(t.weighted_outflow(), Some(Money::from_cents(40000)));
    }

    #[test]
    fn inflows_and_zero_do_not_contribute() {
        assert_eq!(tx("Gehalt", 250000).weighted_outflow(), None);
        assert_eq!(tx("Nothing", 0).weighted_outflow(), None);
    }

    #[test]
    fn haystack_joins_lowercased_fields() {
        let mut t = tx("Supermarkt ABC", -4530);
        t.beneficiary = "ABC GmbH".to_string();
        t.transaction_type = "LASTSCHRIFT".to_string();
        assert_eq!(t.haystack(), "supermarkt abc abc gmbh lastschrift");
    }

    #[test]
    fn haystack_of_empty_fields_is_blank() {
        let t = tx("", -100);
        assert!(t.haystack().trim().is_empty());
    }

    #[test]
    fn with_weight_keeps_other_fields() {
        let original = tx("Kino", -1200);
        let weighted = original.clone().with_weight(Weight::parse("2").unwrap());
        assert_eq!(weighted.description, original.description);
        assert_eq!(weighted.amount, original.amount);
        assert_eq!(weighted.weight.value(), Decimal::from(2));
    }
}

use serde::Serialize;
use std::collections::BTreeMap;

use crate::money::Money;
use crate::transaction::Transaction;

/// Reserved bucket for transactions that match no category keyword.
pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryBucket {
    /// Sum of `|amount| * weight` over the bucket's outflows. Never negative.
    pub total: Money,
    /// Every transaction routed here, in arrival order, regardless of sign.
    pub transactions: Vec<Transaction>,
}

impl CategoryBucket {
    pub fn outflows(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(|t| t.is_outflow())
    }
}

/// Folds categorized transactions into per-category weighted outflow totals.
///
/// Inflows are kept in their bucket's transaction list but never add to a
/// total, even when they land in an income-like category.
#[derive(Debug, Default)]
pub struct Aggregator {
    buckets: BTreeMap<String, CategoryBucket>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, category: &str, tx: Transaction) {
        let bucket = self.buckets.entry(category.to_string()).or_default();
        if let Some(contribution) = tx.weighted_outflow() {
            bucket.total = bucket.total + contribution;
        }
        bucket.transactions.push(tx);
    }

    pub fn finish(self) -> AggregateResult {
        AggregateResult { buckets: self.buckets }
    }
}

impl<S: AsRef<str>> FromIterator<(S, Transaction)> for AggregateResult {
    fn from_iter<I: IntoIterator<Item = (S, Transaction)>>(iter: I) -> Self {
        let mut aggregator = Aggregator::new();
        for (category, tx) in iter {
            aggregator.add(category.as_ref(), tx);
        }
        aggregator.finish()
    }
}

/// Finalized, read-only aggregation of one run (or one month of a run).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateResult {
    buckets: BTreeMap<String, CategoryBucket>,
}

impl AggregateResult {
    pub fn bucket(&self, category: &str) -> Option<&CategoryBucket> {
        self.buckets.get(category)
    }

    pub fn total(&self, category: &str) -> Money {
        self.bucket(category).map(|b| b.total).unwrap_or_default()
    }

    /// Named categories in alphabetical order, the uncategorized bucket excluded.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &CategoryBucket)> {
        self.buckets
            .iter()
            .filter(|(name, _)| name.as_str() != UNCATEGORIZED)
            .map(|(name, bucket)| (name.as_str(), bucket))
    }

    pub fn uncategorized(&self) -> &[Transaction] {
        self.bucket(UNCATEGORIZED)
            .map(|b| b.transactions.as_slice())
            .unwrap_or_default()
    }

    pub fn uncategorized_total(&self) -> Money {
        self.total(UNCATEGORIZED)
    }

    /// Sum of the named category totals.
    pub fn categorized_total(&self) -> Money {
        self.categories().map(|(_, b)| b.total).sum()
    }

    /// Weighted outflows of every transaction seen, uncategorized included.
    pub fn grand_total(&self) -> Money {
        self.buckets.values().map(|b| b.total).sum()
    }

    /// Named categories with a non-zero total, largest first. Ties are
    /// broken by name so output is reproducible.
    pub fn ranked(&self) -> Vec<(&str, Money)> {
        let mut ranked: Vec<(&str, Money)> = self
            .categories()
            .filter(|(_, b)| !b.total.is_zero())
            .map(|(name, b)| (name, b.total))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    pub fn transaction_count(&self) -> usize {
        self.buckets.values().map(|b| b.transactions.len()).sum()
    }
}

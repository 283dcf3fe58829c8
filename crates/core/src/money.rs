use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};
use std::str::FromStr;
use thiserror::Error;

use crate::weight::Weight;

/// Signed statement amount. Negative values are outflows.
///
/// Backed by an exact decimal; no operation rounds, so summing thousands of
/// rows never drifts by a cent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Money(Decimal);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecimalSeparator {
    #[default]
    Comma,
    Point,
}

impl DecimalSeparator {
    pub fn as_char(self) -> char {
        match self {
            DecimalSeparator::Comma => ',',
            DecimalSeparator::Point => '.',
        }
    }

    /// The grouping character that goes with this separator.
    pub fn thousands(self) -> char {
        match self {
            DecimalSeparator::Comma => '.',
            DecimalSeparator::Point => ',',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("amount is empty")]
    Empty,
    #[error("unexpected character '{found}' in amount '{raw}'")]
    UnexpectedChar { raw: String, found: char },
    #[error("amount '{0}' has more than one decimal separator")]
    MultipleSeparators(String),
    #[error("amount '{0}' is not a decimal number")]
    NotANumber(String),
    #[error("amount '{0}' has a thousands separator outside a group of three digits")]
    MisplacedGrouping(String),
}

const CURRENCY_SYMBOLS: &[char] = &['€', '$', '£', '¥', '₣', '₤'];

fn is_currency_noise(c: char) -> bool {
    c.is_whitespace() || c.is_alphabetic() || CURRENCY_SYMBOLS.contains(&c)
}

impl Money {
    pub fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn amount(self) -> Decimal {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_outflow(self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    /// Parse a locale-formatted amount such as `-1.234,56 €` or `EUR 12,50`.
    ///
    /// Currency codes and symbols around the number are ignored and the sign
    /// may lead or trail the digits. Accounting parentheses negate. The
    /// thousands separator that pairs with `separator` is dropped, but only
    /// when it splits the integer part into groups of three after a leading
    /// group of one to three digits.
    pub fn parse_localized(raw: &str, separator: DecimalSeparator) -> Result<Self, MoneyError> {
        let trimmed = raw.trim_matches(is_currency_noise);
        if trimmed.is_empty() {
            return Err(MoneyError::Empty);
        }

        let (parenthesized, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
            Some(inner) => (true, inner.trim_matches(is_currency_noise)),
            None => (false, trimmed),
        };

        let mut normalized = String::with_capacity(body.len() + 1);
        let mut negative = false;
        let mut seen_sign = false;
        let mut seen_separator = false;
        let mut grouping = Grouping::default();

        for c in body.chars() {
            match c {
                '0'..='9' => {
                    if !seen_separator {
                        grouping.digit();
                    }
                    normalized.push(c);
                }
                '-' | '\u{2212}' | '+' if !seen_sign => {
                    // Signs are only accepted at either end of the digits.
                    let at_start = normalized.is_empty();
                    let at_end = body.trim_end().ends_with(c);
                    if !at_start && !at_end {
                        return Err(MoneyError::UnexpectedChar { raw: raw.to_string(), found: c });
                    }
                    negative = c != '+';
                    seen_sign = true;
                }
                c if c == separator.as_char() => {
                    if seen_separator {
                        return Err(MoneyError::MultipleSeparators(raw.to_string()));
                    }
                    if !grouping.is_complete() {
                        return Err(MoneyError::MisplacedGrouping(raw.to_string()));
                    }
                    seen_separator = true;
                    normalized.push('.');
                }
                c if c == separator.thousands() && !seen_separator => {
                    if !grouping.split() {
                        return Err(MoneyError::MisplacedGrouping(raw.to_string()));
                    }
                }
                ' ' | '\u{a0}' | '\u{202f}' | '\'' => {}
                other => {
                    return Err(MoneyError::UnexpectedChar { raw: raw.to_string(), found: other });
                }
            }
        }

        if !normalized.bytes().any(|b| b.is_ascii_digit()) {
            return Err(MoneyError::NotANumber(raw.to_string()));
        }
        if !grouping.is_complete() {
            return Err(MoneyError::MisplacedGrouping(raw.to_string()));
        }

        let mut value = Decimal::from_str(&normalized)
            .map_err(|_| MoneyError::NotANumber(raw.to_string()))?;
        if negative != parenthesized {
            value = -value;
        }
        Ok(Money(value))
    }
}

/// Digit counts of the integer part while thousands separators are seen.
#[derive(Default)]
struct Grouping {
    /// Separators seen so far.
    splits: usize,
    /// Digits since the last separator, or since the start.
    run: usize,
}

impl Grouping {
    fn digit(&mut self) {
        self.run += 1;
    }

    /// Records a thousands separator; `false` when the group it closes has
    /// the wrong length.
    fn split(&mut self) -> bool {
        let closed = self.run;
        self.run = 0;
        self.splits += 1;
        if self.splits == 1 {
            (1..=3).contains(&closed)
        } else {
            closed == 3
        }
    }

    /// The integer part ends here; the last group must hold three digits.
    fn is_complete(&self) -> bool {
        self.splits == 0 || self.run == 3
    }
}

impl fmt::Display for Money {
    /// Cents, half away from zero. Only display rounds.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cents = self.0.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        write!(f, "{cents:.2}")
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Mul<Weight> for Money {
    type Output = Self;
    fn mul(self, rhs: Weight) -> Self {
        Money(self.0 * rhs.value())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

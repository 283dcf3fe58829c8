use outflow_core::{Transaction, UNCATEGORIZED};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// A category and the substrings that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("category name must not be empty")]
    EmptyName,
    #[error("'{0}' is reserved for transactions without a category")]
    ReservedName(String),
    #[error("category '{0}' is declared twice")]
    Duplicate(String),
    #[error("category '{0}' has an empty keyword")]
    EmptyKeyword(String),
}

/// Built-in categories in priority order. Keywords mix German and English.
pub const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "groceries",
        &[
            "edeka", "rewe", "netto", "lidl", "aldi", "kaufland", "penny", "supermarket",
            "supermarkt", "grocery", "lebensmittel", "go asia", "hoffman", "trinkgut", "koro",
        ],
    ),
    (
        "eating_out",
        &[
            "restaurant", "pizza", "burger", "wolt", "lieferando", "deliveroo", "mcdonalds",
            "kfc", "subway", "doner", "döner", "cafe", "bar", "pub", "borgor", "brgrs",
            "salami social", "nguyen", "nihat dincoglu", "harcourt centre", "saigon com nieu",
            "asiagourmet", "panem garage", "koempul restau", "teegeback",
        ],
    ),
    ("household_items", &["dm drogerie", "rossmann"]),
    (
        "pharmacy_health",
        &[
            "apotheke", "pharmacy", "arzt", "doctor", "kranken", "health", "medical",
            "blanka leeker", "techniker krankenkasse", "treatwell", "mikko karhulah", "buycycle",
        ],
    ),
    (
        "rent_and_utilities",
        &[
            "miete", "rent", "wohnung", "apartment", "sev petten", "vattenfall", "strom", "gas",
            "water", "wasser", "heating", "heizung", "electricity", "energie", "telekom",
            "vodafone", "o2", "internet", "telefon", "phone", "mobile", "1+1 telecom", "schufa",
            "squarespace",
        ],
    ),
    (
        "transport",
        &[
            "bvg", "deutsche bahn", "db", "taxi", "uber", "lyft", "benzin", "petrol",
            "gas station", "tankstelle", "mvg", "transport",
        ],
    ),
    (
        "pet_care",
        &[
            "fressnapf", "tierarzt", "veterinary", "pet", "dog", "cat", "hundesteuer",
            "tierbedarf", "drobeck", "getsafe", "tierarztpraxis",
        ],
    ),
    (
        "entertainment",
        &[
            "kino", "cinema", "spotify", "netflix", "concert", "ticket", "resident advisor",
            "club", "bar", "entertainment", "else event",
        ],
    ),
    (
        "bank_fees",
        &[
            "entgeltabschluss", "gebühr", "fee", "bank charge", "commission",
            "balance of settlement",
        ],
    ),
    (
        "shopping",
        &["amazon", "zalando", "otto", "shop", "store", "online", "aliexpress"],
    ),
];

/// Ordered keyword table. The first category with a keyword contained in a
/// transaction's text wins; later categories are not consulted.
///
/// Matching is plain substring search on lower-cased text, so `bar` also
/// hits `barzahlung`. That is intended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRules {
    rules: Vec<CategoryRule>,
}

impl Default for CategoryRules {
    fn default() -> Self {
        let rules = DEFAULT_CATEGORIES
            .iter()
            .map(|(name, keywords)| CategoryRule {
                name: name.to_string(),
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
            })
            .collect();
        Self { rules }
    }
}

impl CategoryRules {
    /// Validates and normalizes `rules`; declaration order is priority order.
    pub fn new(rules: Vec<CategoryRule>) -> Result<Self, RuleError> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(rules.len());

        for rule in rules {
            let name = rule.name.trim().to_string();
            if name.is_empty() {
                return Err(RuleError::EmptyName);
            }
            if name == UNCATEGORIZED {
                return Err(RuleError::ReservedName(name));
            }
            if !seen.insert(name.clone()) {
                return Err(RuleError::Duplicate(name));
            }
            let keywords = rule
                .keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect::<Vec<_>>();
            if keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(RuleError::EmptyKeyword(name));
            }
            normalized.push(CategoryRule { name, keywords });
        }

        Ok(Self { rules: normalized })
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name.as_str())
    }

    /// First category whose keyword occurs in `haystack`, which must already
    /// be lower-cased.
    pub fn classify(&self, haystack: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| haystack.contains(k.as_str())))
            .map(|rule| rule.name.as_str())
    }

    /// Category name for `tx`, or [`UNCATEGORIZED`].
    pub fn categorize(&self, tx: &Transaction) -> &str {
        self.classify(&tx.haystack()).unwrap_or(UNCATEGORIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use outflow_core::{Money, Weight};

    fn make_tx(desc: &str, beneficiary: &str, kind: &str) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            description: desc.to_string(),
            beneficiary: beneficiary.to_string(),
            amount: Money::from_cents(-1000),
            currency: "EUR".to_string(),
            transaction_type: kind.to_string(),
            weight: Weight::ONE,
            source: "account.csv".to_string(),
            row: 2,
        }
    }

    fn make_rules(rules: &[(&str, &[&str])]) -> CategoryRules {
        CategoryRules::new(
            rules
                .iter()
                .map(|(name, kws)| CategoryRule {
                    name: name.to_string(),
                    keywords: kws.iter().map(|k| k.to_string()).collect(),
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn contains_match_case_insensitive() {
        let rules = make_rules(&[("groceries", &["Rewe"])]);
        assert_eq!(rules.categorize(&make_tx("REWE Markt GmbH", "", "")), "groceries");
    }

    #[test]
    fn no_match_is_uncategorized() {
        let rules = make_rules(&[("groceries", &["rewe"])]);
        assert_eq!(rules.categorize(&make_tx("Flohmarkt", "Privat", "GUTSCHRIFT")), UNCATEGORIZED);
    }

    #[test]
    fn empty_haystack_is_uncategorized() {
        assert_eq!(CategoryRules::default().categorize(&make_tx("", "", "")), UNCATEGORIZED);
    }

    #[test]
    fn searches_beneficiary_and_type_too() {
        let rules = make_rules(&[("groceries", &["edeka"]), ("bank_fees", &["entgelt"])]);
        assert_eq!(rules.categorize(&make_tx("Einkauf", "EDEKA Center", "")), "groceries");
        assert_eq!(rules.categorize(&make_tx("", "", "ENTGELTABSCHLUSS")), "bank_fees");
    }

    #[test]
    fn declaration_order_wins() {
        let rules = make_rules(&[("eating_out", &["bar"]), ("entertainment", &["bar", "club"])]);
        assert_eq!(rules.categorize(&make_tx("Bar Rossi", "", "")), "eating_out");
        assert_eq!(rules.categorize(&make_tx("Club Night", "", "")), "entertainment");
    }

    #[test]
    fn substring_matches_inside_words() {
        // "db" hits "Sandbox" in the default table's transport category.
        let rules = CategoryRules::default();
        assert_eq!(rules.categorize(&make_tx("Sandbox Games", "", "")), "transport");
    }

    #[test]
    fn default_table_routes_known_merchants() {
        let rules = CategoryRules::default();
        assert_eq!(rules.categorize(&make_tx("Supermarkt ABC", "ABC GmbH", "LASTSCHRIFT")), "groceries");
        assert_eq!(rules.categorize(&make_tx("Miete Januar", "Vermieter", "UEBERWEISUNG")), "rent_and_utilities");
        assert_eq!(rules.categorize(&make_tx("Karte", "Fressnapf Filiale", "")), "pet_care");
        assert_eq!(rules.names().count(), 10);
    }

    #[test]
    fn categorize_is_deterministic() {
        let rules = CategoryRules::default();
        let tx = make_tx("Lieferando Bestellung", "", "KARTENZAHLUNG");
        let first = rules.categorize(&tx).to_string();
        for _ in 0..100 {
            assert_eq!(rules.categorize(&tx), first);
        }
    }

    #[test]
    fn rejects_invalid_tables() {
        let rule = |name: &str, kw: &str| CategoryRule {
            name: name.to_string(),
            keywords: vec![kw.to_string()],
        };
        assert!(matches!(CategoryRules::new(vec![rule(" ", "x")]), Err(RuleError::EmptyName)));
        assert!(matches!(
            CategoryRules::new(vec![rule(UNCATEGORIZED, "x")]),
            Err(RuleError::ReservedName(_))
        ));
        assert!(matches!(
            CategoryRules::new(vec![rule("a", "x"), rule("a", "y")]),
            Err(RuleError::Duplicate(_))
        ));
        assert!(matches!(CategoryRules::new(vec![rule("a", "  ")]), Err(RuleError::EmptyKeyword(_))));
    }

    #[test]
    fn keywords_are_lowercased_in_order() {
        let rules = make_rules(&[("groceries", &["Supermarkt", "REWE"]), ("rent", &["miete"])]);
        assert_eq!(rules.names().collect::<Vec<_>>(), vec!["groceries", "rent"]);
        assert_eq!(rules.rules()[0].keywords, vec!["supermarkt", "rewe"]);
    }
}

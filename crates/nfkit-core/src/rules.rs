/// Declarative rule table: column name → ordered list of predicates.
///
/// A [`RuleTable`] is plain data. [`RuleTable::catalog`] is the built-in
/// table for the `PRODUTOS` layout; tables can also be round-tripped through
/// JSON so an operator can supply a custom one.
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::columns;

// ---------------------------------------------------------------------------
// RuleTableError
// ---------------------------------------------------------------------------

/// Errors raised while building or loading a rule table.
#[derive(Debug, thiserror::Error)]
pub enum RuleTableError {
    /// A `pattern` predicate carries an invalid regular expression.
    #[error("invalid pattern {pattern:?}: {detail}")]
    InvalidPattern {
        /// The offending source pattern.
        pattern: String,
        /// Regex engine message.
        detail: String,
    },
    /// The JSON document is malformed or does not describe a rule table.
    #[error("invalid rule table JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Pattern
// ---------------------------------------------------------------------------

/// A compiled regular expression that serializes as its source string.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Compiles `source`.
    pub fn new(source: &str) -> Result<Self, RuleTableError> {
        Regex::new(source)
            .map(Self)
            .map_err(|e| RuleTableError::InvalidPattern {
                pattern: source.to_owned(),
                detail: e.to_string(),
            })
    }

    /// Returns `true` if `text` contains a match.
    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    /// The source pattern.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Pattern {
    type Error = RuleTableError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Self::new(&source).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Predicate
// ---------------------------------------------------------------------------

/// One constraint on a column's value.
///
/// Every predicate of a rule is evaluated independently; a cell can fail
/// several at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Predicate {
    /// Value must be non-blank and not numerically zero.
    Required,
    /// Same as [`Predicate::Required`], only when the trimmed text of
    /// `column` in the same row equals `equals`.
    RequiredIf {
        /// Companion column whose value gates the requirement.
        column: String,
        /// Literal that activates the requirement.
        equals: String,
    },
    /// Trimmed non-blank values must not repeat across rows.
    Unique,
    /// ASCII digits only, exactly `count` of them.
    Digits {
        /// Required digit count.
        count: usize,
    },
    /// Exactly `count` characters.
    Length {
        /// Required character count.
        count: usize,
    },
    /// At most `count` characters.
    MaxLength {
        /// Maximum character count.
        count: usize,
    },
    /// Numeric value at least `threshold`.
    Min {
        /// Inclusive lower bound.
        threshold: f64,
    },
    /// Value must match the regular expression.
    Pattern {
        /// Expression tested against the untrimmed value.
        regex: Pattern,
    },
}

impl Predicate {
    /// Builds a [`Predicate::Pattern`] from a regex source.
    pub fn pattern(source: &str) -> Result<Self, RuleTableError> {
        Pattern::new(source).map(|regex| Self::Pattern { regex })
    }

    /// The check kind this predicate reports under.
    pub fn check(&self) -> Check {
        match self {
            Self::Required => Check::Required,
            Self::RequiredIf { .. } => Check::RequiredIf,
            Self::Unique => Check::Unique,
            Self::Digits { .. } => Check::Digits,
            Self::Length { .. } => Check::Length,
            Self::MaxLength { .. } => Check::MaxLength,
            Self::Min { .. } => Check::Min,
            Self::Pattern { .. } => Check::Pattern,
        }
    }
}

/// Kind of check that produced a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    /// [`Predicate::Required`].
    Required,
    /// [`Predicate::RequiredIf`].
    RequiredIf,
    /// [`Predicate::Unique`].
    Unique,
    /// [`Predicate::Digits`].
    Digits,
    /// [`Predicate::Length`].
    Length,
    /// [`Predicate::MaxLength`].
    MaxLength,
    /// [`Predicate::Min`].
    Min,
    /// [`Predicate::Pattern`].
    Pattern,
}

impl Check {
    /// Stable machine-readable code used in JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::RequiredIf => "required_if",
            Self::Unique => "unique",
            Self::Digits => "digits",
            Self::Length => "length",
            Self::MaxLength => "max_length",
            Self::Min => "min",
            Self::Pattern => "pattern",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// Rule / RuleTable
// ---------------------------------------------------------------------------

/// The predicates attached to one column, in evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Header name the rule applies to.
    pub column: String,
    /// Predicates evaluated in order.
    pub predicates: Vec<Predicate>,
}

impl Rule {
    /// Creates a rule.
    pub fn new(column: impl Into<String>, predicates: Vec<Predicate>) -> Self {
        Self {
            column: column.into(),
            predicates,
        }
    }

    /// Returns `true` if the rule carries [`Predicate::Unique`].
    pub fn is_unique(&self) -> bool {
        self.predicates.contains(&Predicate::Unique)
    }
}

/// Built-in rule table variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleVariant {
    /// The primary table: CST PIS/COFINS carry `Min(1)`.
    #[default]
    Standard,
    /// Identical except that CST PIS/COFINS have no numeric minimum.
    NoCstMinimum,
}

impl RuleVariant {
    /// Builds the table for this variant.
    pub fn table(self) -> RuleTable {
        match self {
            Self::Standard => RuleTable::catalog(),
            Self::NoCstMinimum => RuleTable::catalog_without_cst_minimum(),
        }
    }
}

/// Ordered list of column rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::catalog()
    }
}

impl RuleTable {
    /// Wraps an explicit rule list.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The `PRODUTOS` catalog table.
    ///
    /// ```
    /// use nfkit_core::rules::{Predicate, RuleTable};
    ///
    /// let table = RuleTable::catalog();
    /// let price = table.get("Preço").map(|r| r.predicates.clone());
    /// assert_eq!(price, Some(vec![Predicate::Required, Predicate::Min { threshold: 0.01 }]));
    /// ```
    pub fn catalog() -> Self {
        Self::catalog_with_cst_minimum(true)
    }

    /// The catalog table without the `Min(1)` constraint on the CST PIS and
    /// CST COFINS columns.
    pub fn catalog_without_cst_minimum() -> Self {
        Self::catalog_with_cst_minimum(false)
    }

    fn catalog_with_cst_minimum(cst_minimum: bool) -> Self {
        let cst_code = || {
            let mut predicates = vec![Predicate::Required, Predicate::Digits { count: 2 }];
            if cst_minimum {
                predicates.push(Predicate::Min { threshold: 1.0 });
            }
            predicates
        };
        let rate = || {
            vec![
                Predicate::Required,
                Predicate::Min { threshold: 0.0001 },
            ]
        };

        let mut rules = vec![
            Rule::new(columns::INTERNAL_CODE, vec![Predicate::Unique]),
            Rule::new(
                columns::PRODUCT_NAME,
                vec![
                    Predicate::Unique,
                    Predicate::MaxLength {
                        count: columns::PRODUCT_NAME_MAX_CHARS,
                    },
                ],
            ),
            Rule::new(columns::BARCODE, vec![Predicate::Unique]),
        ];
        // Literal pattern; always compiles.
        if let Ok(group) = Predicate::pattern("^[A-Za-z0-9]+$") {
            rules.push(Rule::new(columns::PRODUCT_GROUP, vec![group]));
        }
        rules.extend([
            Rule::new(
                columns::UNIT_TYPE,
                vec![Predicate::Required, Predicate::Length { count: 2 }],
            ),
            Rule::new(
                columns::PRICE,
                vec![Predicate::Required, Predicate::Min { threshold: 0.01 }],
            ),
            Rule::new(
                columns::NCM,
                vec![Predicate::Required, Predicate::Digits { count: 8 }],
            ),
            Rule::new(
                columns::CFOP,
                vec![Predicate::Required, Predicate::Digits { count: 4 }],
            ),
            Rule::new(
                columns::CST,
                vec![Predicate::Required, Predicate::Digits { count: 3 }],
            ),
            Rule::new(
                columns::CEST,
                vec![
                    Predicate::RequiredIf {
                        column: columns::CST.to_owned(),
                        equals: columns::CST_WITH_SUBSTITUTION.to_owned(),
                    },
                    Predicate::Digits { count: 7 },
                ],
            ),
            Rule::new(columns::CST_PIS, cst_code()),
            Rule::new(columns::ALIQ_PIS, rate()),
            Rule::new(columns::CST_COFINS, cst_code()),
            Rule::new(columns::ALIQ_COFINS, rate()),
        ]);
        Self { rules }
    }

    /// Loads a table from JSON of the form `{"rules": [{"column": ..,
    /// "predicates": [{"check": "required"}, ..]}]}`.
    pub fn from_json(json: &str) -> Result<Self, RuleTableError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the table as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, RuleTableError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// All rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The rule for `column`, if any.
    pub fn get(&self, column: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.column == column)
    }

    /// Columns carrying a [`Predicate::Unique`], in table order.
    pub fn unique_columns(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .filter(|r| r.is_unique())
            .map(|r| r.column.as_str())
    }
}

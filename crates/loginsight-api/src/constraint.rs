//! Field constraints and the path grammar used to encode them.
//!
//! A query restricts events through an ordered list of [`FieldConstraint`]s.
//! On the wire each constraint becomes one `field/OPCODE[+value]` path
//! segment, joined by `/` in insertion order:
//!
//! ```text
//! vclap_caseid/EQ+1423244/timestamp/GT+0/hostname/EXISTS
//! ```
//!
//! No escaping happens here; percent-encoding is left to URL construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LogInsightError, Result};

/// Comparison operator of a constraint. The wire tokens are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Text contains.
    Contains,
    /// Text does not contain.
    NotContains,
    /// Field has the token.
    Has,
    /// Field does not have the token.
    NotHas,
    /// Matches a regular expression.
    MatchesRegex,
    /// Does not match a regular expression.
    NotMatchesRegex,
    /// Field is present. Carries no value.
    Exists,
}

impl Operator {
    /// All operators, in wire-table order.
    pub const ALL: [Self; 13] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Ge,
        Self::Lt,
        Self::Le,
        Self::Contains,
        Self::NotContains,
        Self::Has,
        Self::NotHas,
        Self::MatchesRegex,
        Self::NotMatchesRegex,
        Self::Exists,
    ];

    /// The wire token for this operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::Ne => "NE",
            Self::Gt => "GT",
            Self::Ge => "GE",
            Self::Lt => "LT",
            Self::Le => "LE",
            Self::Contains => "CONTAINS",
            Self::NotContains => "NOT_CONTAINS",
            Self::Has => "HAS",
            Self::NotHas => "NOT_HAS",
            Self::MatchesRegex => "MATCHES_REGEX",
            Self::NotMatchesRegex => "NOT_MATCHES_REGEX",
            Self::Exists => "EXISTS",
        }
    }

    /// Whether constraints using this operator carry a value.
    #[must_use]
    pub const fn takes_value(self) -> bool {
        !matches!(self, Self::Exists)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = LogInsightError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| LogInsightError::invalid_request(format!("unknown operator: {s}"), None))
    }
}

/// A single `field OPERATOR [value]` predicate.
///
/// `Exists` constraints never carry a value; every other operator always does.
/// Deserialization enforces the same rule as the constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawFieldConstraint")]
pub struct FieldConstraint {
    field: String,
    operator: Operator,
    value: Option<String>,
}

/// Unchecked serde shape of [`FieldConstraint`].
#[derive(Deserialize)]
struct RawFieldConstraint {
    field: String,
    operator: Operator,
    #[serde(default)]
    value: Option<String>,
}

impl TryFrom<RawFieldConstraint> for FieldConstraint {
    type Error = LogInsightError;

    fn try_from(raw: RawFieldConstraint) -> Result<Self> {
        match (raw.operator, raw.value) {
            (Operator::Exists, None) => Ok(Self::exists(raw.field)),
            (operator, Some(value)) => Self::new(raw.field, operator, value),
            (operator, None) => Err(LogInsightError::invalid_request(
                format!("operator {operator} requires a value"),
                None,
            )),
        }
    }
}

impl FieldConstraint {
    /// Creates a valued constraint.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if `operator` is [`Operator::Exists`].
    pub fn new(
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
    ) -> Result<Self> {
        if !operator.takes_value() {
            return Err(LogInsightError::invalid_request(
                "EXISTS constraints carry no value",
                None,
            ));
        }
        Ok(Self::valued(field, operator, value))
    }

    /// Creates an `EXISTS` constraint.
    pub fn exists(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: Operator::Exists,
            value: None,
        }
    }

    fn valued(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: Some(value.into()),
        }
    }

    /// The constrained field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The operator.
    #[must_use]
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The compared value, absent for `EXISTS`.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The `OPCODE[+value]` half of the encoding.
    #[must_use]
    pub fn operator_segment(&self) -> String {
        match &self.value {
            Some(value) => format!("{}+{value}", self.operator),
            None => self.operator.to_string(),
        }
    }

    /// Encodes this constraint as `field/OPCODE[+value]`.
    #[must_use]
    pub fn path_segment(&self) -> String {
        format!("{}/{}", self.field, self.operator_segment())
    }
}

impl fmt::Display for FieldConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path_segment())
    }
}

impl FromStr for FieldConstraint {
    type Err = LogInsightError;

    /// Parses a single `field/OPCODE[+value]` segment.
    fn from_str(s: &str) -> Result<Self> {
        let (field, rest) = s.split_once('/').ok_or_else(|| {
            LogInsightError::invalid_request(format!("expected field/OPCODE[+value]: {s}"), None)
        })?;
        if field.is_empty() {
            return Err(LogInsightError::invalid_request(
                format!("missing field name: {s}"),
                None,
            ));
        }
        match rest.split_once('+') {
            Some((op, value)) => Self::new(field, op.parse()?, value),
            None => match rest.parse()? {
                Operator::Exists => Ok(Self::exists(field)),
                op => Err(LogInsightError::invalid_request(
                    format!("operator {op} requires a value: {s}"),
                    None,
                )),
            },
        }
    }
}

/// Accumulates constraints in insertion order.
///
/// [`build`](Self::build) and [`build_path_segment`](Self::build_path_segment)
/// never reset the builder; calling more predicate methods afterwards keeps
/// appending to the same list.
///
/// ```rust
/// use loginsight_api::ConstraintBuilder;
///
/// let path = ConstraintBuilder::new()
///     .eq("vclap_caseid", "1423244")
///     .gt("timestamp", "0")
///     .build_path_segment();
/// assert_eq!(path, "vclap_caseid/EQ+1423244/timestamp/GT+0");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConstraintBuilder {
    constraints: Vec<FieldConstraint>,
}

macro_rules! valued_ops {
    ($($(#[$doc:meta])* $name:ident => $op:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, field: impl Into<String>, value: impl Into<String>) -> &mut Self {
                self.constraints
                    .push(FieldConstraint::valued(field, Operator::$op, value));
                self
            }
        )*
    };
}

impl ConstraintBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    valued_ops! {
        /// Appends `field/EQ+value`.
        eq => Eq,
        /// Appends `field/NE+value`.
        ne => Ne,
        /// Appends `field/GT+value`.
        gt => Gt,
        /// Appends `field/GE+value`.
        ge => Ge,
        /// Appends `field/LT+value`.
        lt => Lt,
        /// Appends `field/LE+value`.
        le => Le,
        /// Appends `field/CONTAINS+value`.
        contains => Contains,
        /// Appends `field/NOT_CONTAINS+value`.
        not_contains => NotContains,
        /// Appends `field/HAS+value`.
        has => Has,
        /// Appends `field/NOT_HAS+value`.
        not_has => NotHas,
        /// Appends `field/MATCHES_REGEX+value`.
        matches_regex => MatchesRegex,
        /// Appends `field/NOT_MATCHES_REGEX+value`.
        not_matches_regex => NotMatchesRegex,
    }

    /// Appends `field/EXISTS`.
    pub fn exists(&mut self, field: impl Into<String>) -> &mut Self {
        self.constraints.push(FieldConstraint::exists(field));
        self
    }

    /// Appends an already constructed constraint.
    pub fn push(&mut self, constraint: FieldConstraint) -> &mut Self {
        self.constraints.push(constraint);
        self
    }

    /// Returns the accumulated constraints without clearing them.
    #[must_use]
    pub fn build(&self) -> Vec<FieldConstraint> {
        self.constraints.clone()
    }

    /// Serializes the accumulated constraints into the path grammar.
    ///
    /// An empty builder yields an empty string.
    #[must_use]
    pub fn build_path_segment(&self) -> String {
        path_segment(&self.constraints)
    }

    /// Number of accumulated constraints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Returns true if no constraint has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

/// Joins the segments of `constraints` with `/`, without a trailing separator.
#[must_use]
pub fn path_segment(constraints: &[FieldConstraint]) -> String {
    constraints
        .iter()
        .map(FieldConstraint::path_segment)
        .collect::<Vec<_>>()
        .join("/")
}

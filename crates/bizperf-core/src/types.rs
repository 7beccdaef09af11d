//! Core domain types for bizperf
//!
//! This module contains the records stored in each table, the master-data
//! lookups, and the strongly-typed identifiers and periods used when
//! grouping rows into report lines.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Strongly-typed record identifier
///
/// Every persisted row carries one; the store assigns it on create.
///
/// # Examples
/// ```
/// use bizperf_core::types::RecordId;
///
/// let id = RecordId::new();
/// let parsed: RecordId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = crate::error::BizperfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| crate::error::BizperfError::InvalidArgument(format!("Invalid id '{s}'")))
    }
}

/// A `(year, month)` pair, the unit of time reports aggregate over
///
/// Ordering is chronological.
///
/// # Examples
/// ```
/// use bizperf_core::types::Period;
///
/// let jan = Period::new(2024, 1).unwrap();
/// let dec = Period::new(2023, 12).unwrap();
/// assert!(dec < jan);
/// assert_eq!(jan.to_string(), "2024-01");
/// assert!(Period::new(2024, 13).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    /// Create a validated period
    pub fn new(year: i32, month: u32) -> crate::Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(crate::error::BizperfError::InvalidPeriod(format!(
                "month must be between 1-12, got {month}"
            )));
        }
        Ok(Self { year, month })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Grouping key of a report line
///
/// Customers are grouped within their company, so the same customer billed
/// through two companies yields two lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupKey {
    Company {
        company_id: String,
    },
    Division {
        division_id: String,
    },
    Customer {
        customer_id: String,
        company_id: Option<String>,
    },
    /// The whole organization, used by the business report
    Organization,
}

/// Revenue line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueRecord {
    #[serde(default)]
    pub id: RecordId,
    #[serde(deserialize_with = "lenient_year")]
    pub year: i32,
    #[serde(deserialize_with = "lenient_month")]
    pub month: u32,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub division_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    /// Billable man-months
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub vnd_revenue: f64,
    #[serde(default)]
    pub note: Option<String>,
}

/// Salary allocated to a company/division/customer for a month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryCostRecord {
    #[serde(default)]
    pub id: RecordId,
    #[serde(deserialize_with = "lenient_year")]
    pub year: i32,
    #[serde(deserialize_with = "lenient_month")]
    pub month: u32,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub division_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: f64,
}

/// Organization-wide cost line; only `is_cost` rows feed the overhead pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverheadCostRecord {
    #[serde(default)]
    pub id: RecordId,
    #[serde(deserialize_with = "lenient_year")]
    pub year: i32,
    #[serde(deserialize_with = "lenient_month")]
    pub month: u32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cost: f64,
    #[serde(default)]
    pub is_cost: bool,
}

/// Which bonus table a rate belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusScope {
    Company,
    Division,
}

impl fmt::Display for BonusScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BonusScope::Company => write!(f, "company"),
            BonusScope::Division => write!(f, "division"),
        }
    }
}

/// Per-BMM bonus rate of a company or division for a year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusRateRecord {
    #[serde(default)]
    pub id: RecordId,
    #[serde(deserialize_with = "lenient_year")]
    pub year: i32,
    pub scope: BonusScope,
    /// Company id or division id depending on `scope`
    pub entity_id: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub bn_bmm: f64,
}

/// A master-data entry: company, division, or customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterEntry {
    pub id: String,
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub company_id: Option<String>,
}

/// Master-data lookups used to label report lines and resolve import codes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterData {
    #[serde(default)]
    pub companies: Vec<MasterEntry>,
    #[serde(default)]
    pub divisions: Vec<MasterEntry>,
    #[serde(default)]
    pub customers: Vec<MasterEntry>,
}

/// Master-data table selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterKind {
    Company,
    Division,
    Customer,
}

impl MasterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MasterKind::Company => "company",
            MasterKind::Division => "division",
            MasterKind::Customer => "customer",
        }
    }
}

impl MasterData {
    fn entries(&self, kind: MasterKind) -> &[MasterEntry] {
        match kind {
            MasterKind::Company => &self.companies,
            MasterKind::Division => &self.divisions,
            MasterKind::Customer => &self.customers,
        }
    }

    /// Find an entry by id
    pub fn by_id(&self, kind: MasterKind, id: &str) -> Option<&MasterEntry> {
        self.entries(kind).iter().find(|e| e.id == id)
    }

    /// Find an entry by its human-readable code, case-insensitively
    pub fn by_code(&self, kind: MasterKind, code: &str) -> Option<&MasterEntry> {
        let code = code.trim();
        self.entries(kind)
            .iter()
            .find(|e| e.code.eq_ignore_ascii_case(code))
    }

    /// Display code for an id, falling back to the id itself
    pub fn code_of(&self, kind: MasterKind, id: &str) -> String {
        self.by_id(kind, id)
            .map(|e| e.code.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Display name for an id, empty when unknown
    pub fn name_of(&self, kind: MasterKind, id: &str) -> String {
        self.by_id(kind, id)
            .map(|e| e.name.clone())
            .unwrap_or_default()
    }
}

/// Coerce a JSON value into a finite `f64`, defaulting to 0
///
/// Accepts numbers, numeric strings (thousands separators allowed),
/// booleans and null. Anything unparseable becomes 0.
pub fn coerce_f64(value: &serde_json::Value) -> f64 {
    let n = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => parse_lenient(s),
        serde_json::Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    };
    if n.is_finite() { n } else { 0.0 }
}

/// Parse a numeric cell the way a spreadsheet user writes it
///
/// # Examples
/// ```
/// use bizperf_core::types::parse_lenient;
///
/// assert_eq!(parse_lenient("1,200.5"), 1200.5);
/// assert_eq!(parse_lenient("  42 "), 42.0);
/// assert_eq!(parse_lenient("n/a"), 0.0);
/// assert_eq!(parse_lenient(""), 0.0);
/// ```
pub fn parse_lenient(s: &str) -> f64 {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',' && *c != '_').collect();
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let n = coerce_f64(&value);
    if n == 0.0 && !matches!(value, serde_json::Value::Number(_) | serde_json::Value::Null) {
        tracing::trace!("Coerced non-numeric value {value} to 0");
    }
    Ok(n)
}

/// Whole-number part of a lenient value, 0 when fractional or out of range
fn lenient_int<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64> + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let n = coerce_f64(&value);
    if n.fract() != 0.0 || n < i64::MIN as f64 || n > i64::MAX as f64 {
        tracing::trace!("Coerced non-integer value {value} to 0");
        return Ok(T::default());
    }
    Ok(T::try_from(n as i64).unwrap_or_default())
}

fn lenient_year<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i32, D::Error> {
    lenient_int(deserializer)
}

fn lenient_month<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    lenient_int(deserializer)
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StaffCodeError {
    #[error("Staff code is empty")]
    Empty,
    #[error("Staff code contains invalid character: '{0}'")]
    InvalidChar(char),
}

/// An alphanumeric employee identifier as printed on the payslip and in
/// column B of the payroll template ("Y0034", "AF0001").
///
/// Stored normalized: trimmed and uppercased, so spreadsheet lookups are
/// insensitive to the casing and padding OCR tends to mangle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StaffCode(String);

impl StaffCode {
    pub fn new(raw: &str) -> Result<Self, StaffCodeError> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(StaffCodeError::Empty);
        }
        if let Some(c) = normalized.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(StaffCodeError::InvalidChar(c));
        }
        Ok(StaffCode(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a raw cell value refers to this code, using the same
    /// trim + uppercase normalization.
    pub fn matches(&self, cell: &str) -> bool {
        cell.trim().to_uppercase() == self.0
    }
}

impl fmt::Display for StaffCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StaffCode {
    type Err = StaffCodeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StaffCode::new(s)
    }
}

impl TryFrom<String> for StaffCode {
    type Error = StaffCodeError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        StaffCode::new(&s)
    }
}

impl From<StaffCode> for String {
    fn from(code: StaffCode) -> String {
        code.0
    }
}

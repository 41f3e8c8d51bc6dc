//! Naming of the atomic fulfillment procedure.

use crate::{Result, StoreError};

/// Name of the database-side operation that performs the whole
/// validate-match-commit sequence in one call.
///
/// The name is interpolated into SQL, so it is restricted to a plain
/// identifier, optionally qualified by a schema (`schema.name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcedureName(String);

impl ProcedureName {
    /// Procedure installed by the bundled migrations.
    pub const DEFAULT: &'static str = "add_product_to_warehouse";

    const MAX_PART_LEN: usize = 63;

    /// Validates and wraps a procedure name.
    pub fn parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() > 2 || !parts.iter().all(|part| Self::is_identifier(part)) {
            return Err(StoreError::InvalidProcedureName(name));
        }
        Ok(Self(name))
    }

    /// Returns the name as written in SQL.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_identifier(part: &str) -> bool {
        let mut chars = part.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
            _ => return false,
        }
        part.len() <= Self::MAX_PART_LEN && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

impl Default for ProcedureName {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl std::fmt::Display for ProcedureName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ProcedureName {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

//! Policy failure types.
//!
//! Every rejection the kernel can produce is an instance of a closed
//! taxonomy. The split matters operationally: `BadQuery` means the input is
//! unfit (malformed, multi-statement, DDL), `ComplicatedQuery` means the
//! statement parses but uses a construct outside the supported subset, and
//! the remaining kinds are authorisation outcomes.

use std::fmt;

use crate::vector::AccessVector;

/// Error type for policy failures.
#[derive(Debug, Clone)]
pub struct PolicyError {
    kind: PolicyErrorKind,
    message: String,
}

/// Categories of policy failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyErrorKind {
    /// Input is not a single well-formed DML statement, or is DDL.
    BadQuery,
    /// Statement parses but uses an unsupported construct.
    ComplicatedQuery,
    /// A vector references a table not declared on the target.
    UnknownTable,
    /// A vector references a column not declared on the table.
    UnknownColumn,
    /// No rule allowed the vector.
    AccessDenied,
}

impl PolicyError {
    pub(crate) fn new(kind: PolicyErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn bad_query(message: impl Into<String>) -> Self {
        Self::new(PolicyErrorKind::BadQuery, message)
    }

    pub(crate) fn complicated(message: impl Into<String>) -> Self {
        Self::new(PolicyErrorKind::ComplicatedQuery, message)
    }

    pub(crate) fn unknown_table(table: &str) -> Self {
        Self::new(
            PolicyErrorKind::UnknownTable,
            format!("table '{table}' is not declared on this target"),
        )
    }

    pub(crate) fn unknown_column(table: &str, column: &str) -> Self {
        Self::new(
            PolicyErrorKind::UnknownColumn,
            format!("column '{table}.{column}' is not declared on this target"),
        )
    }

    pub(crate) fn access_denied(vector: &AccessVector) -> Self {
        Self::new(
            PolicyErrorKind::AccessDenied,
            format!("denied operation: {vector}"),
        )
    }

    pub fn kind(&self) -> PolicyErrorKind {
        self.kind
    }

    /// Whether this failure must surface to users as a uniform access
    /// denial. Schema lookups share the quality so a probing client cannot
    /// distinguish "column does not exist" from "column exists but is
    /// forbidden".
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self.kind,
            PolicyErrorKind::UnknownTable
                | PolicyErrorKind::UnknownColumn
                | PolicyErrorKind::AccessDenied
        )
    }
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for PolicyError {}

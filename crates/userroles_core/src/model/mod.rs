//! Domain model for role-based accounts.
//!
//! # Responsibility
//! - Define the `Role` and `User` records shared by repositories and the
//!   relationship adapter.
//! - Define the `Entity` contract generic repositories are written against.
//!
//! # Invariants
//! - Every entity keeps one stable id for its whole lifetime.
//! - A user references roles; it never owns them.

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;

pub mod role;
pub mod user;

/// A persisted record addressable by a typed id.
pub trait Entity: Clone {
    /// Stable identity type.
    type Id: Copy + Eq + Ord + Hash + Debug + Display;

    /// Resource type name used in logs, errors and relationship routing.
    const RESOURCE_TYPE: &'static str;

    /// Returns the stable id of this record.
    fn id(&self) -> Self::Id;
}

/// Field-level validation failure raised before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Required text field is empty after trimming.
    BlankField {
        resource: &'static str,
        field: &'static str,
    },
    /// Email value is not shaped like `local@domain`.
    InvalidEmail(String),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField { resource, field } => {
                write!(f, "{resource}.{field} must not be blank")
            }
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) fn require_non_blank(
    resource: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::BlankField { resource, field });
    }
    Ok(())
}

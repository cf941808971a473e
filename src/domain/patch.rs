//! Three-state field for partial updates
//!
//! A JSON field can be missing, explicitly `null`, or carry a value.
//! `Patch<T>` keeps those apart so an update can tell "leave unchanged"
//! from "clear".
//!
//! ```ignore
//! #[derive(Deserialize)]
//! struct Body {
//!     #[serde(default)]
//!     end_date: Patch<String>,
//! }
//! ```
//!
//! The `#[serde(default)]` attribute is required: it is what maps a missing
//! field to `Patch::Unset`.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Field absent: leave the stored value untouched.
    Unset,
    /// Field explicitly null: clear the stored value.
    Clear,
    /// Field present with a value.
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T> Patch<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Apply to an optional stored value.
    pub fn apply_to(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Unset => current,
            Self::Clear => None,
            Self::Value(v) => Some(v),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Value(v),
            None => Self::Clear,
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Into::into)
    }
}

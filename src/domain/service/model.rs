//! Service domain entity

/// A subscribable service, identified by its unique trimmed name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub id: i32,
    pub name: String,
}

impl Service {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Canonical form of a service name: surrounding whitespace removed.
    /// `None` when nothing is left.
    pub fn normalize_name(raw: &str) -> Option<&str> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

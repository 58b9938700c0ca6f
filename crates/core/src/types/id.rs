//! Habit identifiers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a habit record.
///
/// The document store assigns it at creation and it never changes. Callers
/// should not assume any format: the MongoDB backend uses 24-character hex
/// object ids, the in-memory backend uses its own scheme. A value that the
/// active backend cannot interpret simply matches no record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(String);

impl HabitId {
    /// Wrap a raw identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for HabitId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for HabitId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_habit_id_is_transparent() {
        let id = HabitId::new("65f1c0ffee0000000000beef");
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"65f1c0ffee0000000000beef\""
        );
        assert_eq!(id.to_string(), "65f1c0ffee0000000000beef");
    }
}

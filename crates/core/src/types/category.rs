//! Category filtering for public habit listings.

/// Category value that clients send to mean "no category restriction".
pub const ALL_CATEGORIES: &str = "All";

/// A category restriction parsed from a query string.
///
/// ```
/// use habit_tracker_core::CategoryFilter;
///
/// assert_eq!(CategoryFilter::from_query(None), CategoryFilter::Any);
/// assert_eq!(CategoryFilter::from_query(Some("All")), CategoryFilter::Any);
/// assert_eq!(
///     CategoryFilter::from_query(Some("Fitness")),
///     CategoryFilter::Exact("Fitness".to_string())
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Every category matches.
    #[default]
    Any,
    /// Only habits whose category equals this value.
    Exact(String),
}

impl CategoryFilter {
    /// Interpret an optional `category` query parameter.
    ///
    /// Absent, empty, and the [`ALL_CATEGORIES`] sentinel all mean [`CategoryFilter::Any`].
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            None | Some("" | ALL_CATEGORIES) => Self::Any,
            Some(category) => Self::Exact(category.to_owned()),
        }
    }

    /// Whether a habit in `category` passes this filter.
    #[must_use]
    pub fn matches(&self, category: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(wanted) => wanted == category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_is_case_sensitive() {
        let filter = CategoryFilter::from_query(Some("Fitness"));
        assert!(filter.matches("Fitness"));
        assert!(!filter.matches("fitness"));
        assert!(!filter.matches("Study"));
    }

    #[test]
    fn test_any_matches_everything() {
        let filter = CategoryFilter::from_query(Some(ALL_CATEGORIES));
        assert!(filter.matches("Fitness"));
        assert!(filter.matches(""));
    }
}

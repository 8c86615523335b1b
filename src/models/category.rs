use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The fixed set of spending/income categories.
///
/// Variant order is the declaration order used to break ties in every
/// ranking, so `Ord` is derived and the variants must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Food & Dining")]
    FoodAndDining,
    #[serde(rename = "Transportation")]
    Transportation,
    #[serde(rename = "Shopping")]
    Shopping,
    #[serde(rename = "Entertainment")]
    Entertainment,
    #[serde(rename = "Bills & Utilities")]
    BillsAndUtilities,
    #[serde(rename = "Healthcare")]
    Healthcare,
    #[serde(rename = "Travel")]
    Travel,
    #[serde(rename = "Education")]
    Education,
    #[serde(rename = "Personal Care")]
    PersonalCare,
    #[serde(rename = "Other")]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FoodAndDining => "Food & Dining",
            Self::Transportation => "Transportation",
            Self::Shopping => "Shopping",
            Self::Entertainment => "Entertainment",
            Self::BillsAndUtilities => "Bills & Utilities",
            Self::Healthcare => "Healthcare",
            Self::Travel => "Travel",
            Self::Education => "Education",
            Self::PersonalCare => "Personal Care",
            Self::Other => "Other",
        }
    }

    /// All categories in declaration order.
    pub fn all() -> &'static [Category] {
        &[
            Self::FoodAndDining,
            Self::Transportation,
            Self::Shopping,
            Self::Entertainment,
            Self::BillsAndUtilities,
            Self::Healthcare,
            Self::Travel,
            Self::Education,
            Self::PersonalCare,
            Self::Other,
        ]
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Returned when a label is not one of the fixed categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl std::fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown category: {}", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Exact label match. Lookup is case-insensitive so the CLI can accept
    /// `"food & dining"`, but no other aliasing happens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::all()
            .iter()
            .find(|c| c.as_str().to_lowercase() == lower)
            .copied()
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

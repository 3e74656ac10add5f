//! Merchandising labels attached to products.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Badge shown on a product card.
///
/// The API sends the display text of the label. Unknown labels are kept
/// verbatim so a new label added server-side still renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProductLabel {
    #[default]
    Default,
    New,
    BestSeller,
    Other(String),
}

impl ProductLabel {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Default => "Default",
            Self::New => "New",
            Self::BestSeller => "Best seller",
            Self::Other(s) => s,
        }
    }

    /// Whether a badge should be rendered at all.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        !matches!(self, Self::Default)
    }

    /// Badge color class, if the label has one.
    #[must_use]
    pub const fn badge_color(&self) -> Option<&'static str> {
        match self {
            Self::New => Some("olive"),
            Self::BestSeller => Some("red"),
            Self::Default | Self::Other(_) => None,
        }
    }
}

impl From<&str> for ProductLabel {
    fn from(s: &str) -> Self {
        match s.trim() {
            "" | "Default" => Self::Default,
            "New" => Self::New,
            "Best seller" => Self::BestSeller,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Serialize for ProductLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProductLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or(Self::Default, Self::from))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        let label: ProductLabel = serde_json::from_str("\"Best seller\"").unwrap();
        assert_eq!(label, ProductLabel::BestSeller);
        assert_eq!(label.badge_color(), Some("red"));
        assert_eq!(ProductLabel::New.badge_color(), Some("olive"));
    }

    #[test]
    fn test_default_and_null_are_hidden() {
        let label: ProductLabel = serde_json::from_str("null").unwrap();
        assert!(!label.is_visible());
        let label: ProductLabel = serde_json::from_str("\"Default\"").unwrap();
        assert!(!label.is_visible());
    }

    #[test]
    fn test_unknown_label_is_kept() {
        let label: ProductLabel = serde_json::from_str("\"Limited\"").unwrap();
        assert_eq!(label.as_str(), "Limited");
        assert!(label.is_visible());
        assert_eq!(label.badge_color(), None);
    }
}

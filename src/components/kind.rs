use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// Every component table the catalog knows about.
///
/// Each kind owns a storage table keyed on its natural value and a junction
/// table `entity_<kind>` keyed on `(entity_id, <kind>_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Currency,
    Description,
    Feature,
    File,
    Image,
    MerchandisedColor,
    Pattern,
    Price,
    PrimaryColor,
    Sku,
    Style,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 11] = [
        ComponentKind::Currency,
        ComponentKind::Description,
        ComponentKind::Feature,
        ComponentKind::File,
        ComponentKind::Image,
        ComponentKind::MerchandisedColor,
        ComponentKind::Pattern,
        ComponentKind::Price,
        ComponentKind::PrimaryColor,
        ComponentKind::Sku,
        ComponentKind::Style,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Currency => "currency",
            ComponentKind::Description => "description",
            ComponentKind::Feature => "feature",
            ComponentKind::File => "file",
            ComponentKind::Image => "image",
            ComponentKind::MerchandisedColor => "merchandised_color",
            ComponentKind::Pattern => "pattern",
            ComponentKind::Price => "price",
            ComponentKind::PrimaryColor => "primary_color",
            ComponentKind::Sku => "sku",
            ComponentKind::Style => "style",
        }
    }

    /// Storage table. Matches the kind name.
    pub const fn table(self) -> &'static str {
        self.as_str()
    }

    /// Column holding the natural key for text-keyed kinds.
    ///
    /// Price is keyed on `(currency_id, value)` and image on `file_id`; both
    /// return the column their raw value is matched against.
    pub const fn key_column(self) -> &'static str {
        match self {
            ComponentKind::Currency => "code",
            ComponentKind::Description | ComponentKind::Feature => "contents",
            ComponentKind::File => "source",
            ComponentKind::Image => "file_id",
            ComponentKind::MerchandisedColor
            | ComponentKind::Pattern
            | ComponentKind::PrimaryColor
            | ComponentKind::Style => "name",
            ComponentKind::Price => "value",
            ComponentKind::Sku => "value",
        }
    }

    pub fn junction_table(self) -> String {
        format!("entity_{}", self.as_str())
    }

    pub fn junction_column(self) -> String {
        format!("{}_id", self.as_str())
    }

    /// Kind whose rows must exist before this kind can be upserted.
    pub const fn prerequisite(self) -> Option<ComponentKind> {
        match self {
            ComponentKind::Price => Some(ComponentKind::Currency),
            ComponentKind::Image => Some(ComponentKind::File),
            _ => None,
        }
    }

    /// Kinds that some other kind depends on; these upsert in the first wave.
    pub fn is_prerequisite(self) -> bool {
        Self::ALL.iter().any(|k| k.prerequisite() == Some(self))
    }

    pub const fn is_price(self) -> bool {
        matches!(self, ComponentKind::Price)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == needle)
            .ok_or_else(|| IngestError::UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_loosely() {
        assert_eq!(
            "merchandised_color".parse::<ComponentKind>().unwrap(),
            ComponentKind::MerchandisedColor
        );
        assert_eq!(
            " Primary Color ".parse::<ComponentKind>().unwrap(),
            ComponentKind::PrimaryColor
        );
        assert!(matches!(
            "colour".parse::<ComponentKind>(),
            Err(IngestError::UnknownKind(_))
        ));
    }

    #[test]
    fn prerequisites_form_two_waves() {
        let first: Vec<_> = ComponentKind::ALL
            .into_iter()
            .filter(|k| k.is_prerequisite())
            .collect();
        assert_eq!(first, vec![ComponentKind::Currency, ComponentKind::File]);
        for kind in ComponentKind::ALL {
            if let Some(pre) = kind.prerequisite() {
                assert!(pre.prerequisite().is_none(), "{kind} has a nested prerequisite");
            }
        }
    }

    #[test]
    fn junction_naming() {
        assert_eq!(ComponentKind::PrimaryColor.junction_table(), "entity_primary_color");
        assert_eq!(ComponentKind::Image.junction_column(), "image_id");
    }
}

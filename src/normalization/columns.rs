use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;

use crate::components::ComponentKind;

/// How a single CSV column feeds the component model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnClass {
    /// Mapped explicitly through the column table.
    Component(ComponentKind),
    /// Unmapped column whose name marks it as a file reference (`url`);
    /// `image` is set when the name also contains `image`.
    Attachment { image: bool },
    Ignored,
}

/// Immutable column -> kind table handed to the extractor.
#[derive(Debug, Default, Clone)]
pub struct ColumnMap {
    columns: HashMap<String, ComponentKind>,
}

impl ColumnMap {
    /// Column layout of the Karastan rug product export.
    pub fn karastan() -> Self {
        Self::default()
            .register("Inventory Sku Number", ComponentKind::Sku)
            .register("Rug Copy", ComponentKind::Description)
            // semicolon separated list, initial caps
            .register("Pattern", ComponentKind::Pattern)
            .register("Feature 1", ComponentKind::Feature)
            .register("Feature 2", ComponentKind::Feature)
            .register("Feature 3", ComponentKind::Feature)
            .register("Feature 4", ComponentKind::Feature)
            .register("Feature 5", ComponentKind::Feature)
            .register("MSRP", ComponentKind::Price)
            .register("Style", ComponentKind::Style)
            .register("Basic Color Group", ComponentKind::PrimaryColor)
            .register("Color Name", ComponentKind::MerchandisedColor)
    }

    /// Register or override the kind for a column.
    pub fn register(mut self, column: impl Into<String>, kind: ComponentKind) -> Self {
        self.columns.insert(column.into().trim().to_string(), kind);
        self
    }

    /// Parse a `{"Column": "kind"}` JSON object.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let entries: IndexMap<String, String> =
            serde_json::from_str(raw).context("column map must be a JSON object of strings")?;
        entries
            .into_iter()
            .try_fold(Self::default(), |map, (column, kind)| {
                let kind = kind
                    .parse::<ComponentKind>()
                    .with_context(|| format!("column {column:?}"))?;
                Ok(map.register(column, kind))
            })
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading column map {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn get(&self, column: &str) -> Option<ComponentKind> {
        self.columns.get(column.trim()).copied()
    }

    pub fn classify(&self, column: &str) -> ColumnClass {
        if let Some(kind) = self.get(column) {
            return ColumnClass::Component(kind);
        }
        let lower = column.to_lowercase();
        if lower.contains("url") {
            ColumnClass::Attachment {
                image: lower.contains("image"),
            }
        } else {
            ColumnClass::Ignored
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_mapped_columns() {
        let map = ColumnMap::karastan();
        assert_eq!(map.classify("MSRP"), ColumnClass::Component(ComponentKind::Price));
        assert_eq!(
            map.classify("Feature 4"),
            ColumnClass::Component(ComponentKind::Feature)
        );
        assert_eq!(map.classify(" Style "), ColumnClass::Component(ComponentKind::Style));
        assert_eq!(map.len(), 12);
    }

    #[test]
    fn falls_back_to_attachment_naming() {
        let map = ColumnMap::karastan();
        assert_eq!(
            map.classify("Hero Image URL"),
            ColumnClass::Attachment { image: true }
        );
        assert_eq!(
            map.classify("Spec Sheet Url"),
            ColumnClass::Attachment { image: false }
        );
        // image-ness alone does not make a file
        assert_eq!(map.classify("Image Caption"), ColumnClass::Ignored);
        assert_eq!(map.classify("Weight"), ColumnClass::Ignored);
    }

    #[test]
    fn explicit_mapping_wins_over_naming() {
        let map = ColumnMap::default().register("Swatch Image URL", ComponentKind::Description);
        assert_eq!(
            map.classify("Swatch Image URL"),
            ColumnClass::Component(ComponentKind::Description)
        );
    }

    #[test]
    fn loads_json_map() {
        let map =
            ColumnMap::from_json_str(r#"{"Colour": "primary_color", "Retail": "price"}"#).unwrap();
        assert_eq!(map.get("Colour"), Some(ComponentKind::PrimaryColor));
        assert_eq!(map.get("Retail"), Some(ComponentKind::Price));
        assert!(ColumnMap::from_json_str(r#"{"Colour": "hue"}"#).is_err());
        assert!(ColumnMap::from_json_str("[1, 2]").is_err());
    }
}

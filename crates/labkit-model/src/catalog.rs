//! Resource and tool catalog
//!
//! Static, read-only metadata about the equipment and reagents a lab offers.
//! The engine never interprets catalog entries; it only compares ids. The
//! catalog is used to decide what to offer for a procedure and to catch
//! procedures that reference ids nobody declared.

use crate::error::ModelError;
use crate::ids::{ResourceId, ToolId};
use crate::procedure::Procedure;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// Broad grouping used by the UI shelves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    /// Metals and metal filings
    Metal,
    /// Acids
    Acid,
    /// Bases
    Base,
    /// Salts
    Salt,
    /// pH indicators
    Indicator,
    /// Water and other solvents
    Solvent,
    /// Tubes, beakers, flasks
    Glassware,
    /// Burners and hot plates
    Heating,
    /// Loops, tongs, burettes
    Instrument,
    /// Anything else
    #[default]
    Other,
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry<Id> {
    /// Stable id
    pub id: Id,
    /// Name shown to learners
    pub display_name: String,
    /// Shelf grouping
    #[serde(default)]
    pub category: ItemCategory,
}

impl<Id> CatalogEntry<Id> {
    /// Create an entry
    #[must_use]
    pub fn new(id: impl Into<Id>, display_name: impl Into<String>, category: ItemCategory) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            category,
        }
    }
}

/// Tool entry
pub type ToolEntry = CatalogEntry<ToolId>;
/// Resource entry
pub type ResourceEntry = CatalogEntry<ResourceId>;

/// Serialized form of a [`Catalog`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDef {
    /// Equipment
    #[serde(default)]
    pub tools: Vec<ToolEntry>,
    /// Reagents
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
}

/// Ordered lookup of tools and resources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CatalogDef", into = "CatalogDef")]
pub struct Catalog {
    tools: IndexMap<ToolId, ToolEntry>,
    resources: IndexMap<ResourceId, ResourceEntry>,
}

/// Catalog entries relevant to one procedure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferedItems<'a> {
    /// Tools to place on the bench
    pub tools: Vec<&'a ToolEntry>,
    /// Resources to place on the shelf
    pub resources: Vec<&'a ResourceEntry>,
}

impl Catalog {
    /// Create an empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool
    ///
    /// # Errors
    /// [`ModelError::DuplicateCatalogEntry`] if the id is taken.
    pub fn add_tool(&mut self, entry: ToolEntry) -> Result<(), ModelError> {
        insert_unique(&mut self.tools, entry.id.clone(), entry)
    }

    /// Register a resource
    ///
    /// # Errors
    /// [`ModelError::DuplicateCatalogEntry`] if the id is taken.
    pub fn add_resource(&mut self, entry: ResourceEntry) -> Result<(), ModelError> {
        insert_unique(&mut self.resources, entry.id.clone(), entry)
    }

    /// Look up a tool
    #[inline]
    #[must_use]
    pub fn tool(&self, id: &str) -> Option<&ToolEntry> {
        self.tools.get(id)
    }

    /// Look up a resource
    #[inline]
    #[must_use]
    pub fn resource(&self, id: &str) -> Option<&ResourceEntry> {
        self.resources.get(id)
    }

    /// Tools in declaration order
    pub fn tools(&self) -> impl Iterator<Item = &ToolEntry> {
        self.tools.values()
    }

    /// Resources in declaration order
    pub fn resources(&self) -> impl Iterator<Item = &ResourceEntry> {
        self.resources.values()
    }

    /// Whether nothing is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty() && self.resources.is_empty()
    }

    /// Total number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len() + self.resources.len()
    }

    /// Entries the UI should offer for `procedure`, in catalog order
    ///
    /// Ids the catalog does not know are skipped; use
    /// [`Catalog::check_procedure`] to detect them.
    #[must_use]
    pub fn offered_for(&self, procedure: &Procedure) -> OfferedItems<'_> {
        OfferedItems {
            tools: self
                .tools
                .values()
                .filter(|entry| procedure.required_tools().contains(&entry.id))
                .collect(),
            resources: self
                .resources
                .values()
                .filter(|entry| procedure.required_resources().contains(&entry.id))
                .collect(),
        }
    }

    /// Ensure every id `procedure` references is declared
    ///
    /// # Errors
    /// The first unknown tool or resource.
    pub fn check_procedure(&self, procedure: &Procedure) -> Result<(), ModelError> {
        if let Some(tool) = procedure
            .required_tools()
            .iter()
            .find(|id| !self.tools.contains_key(*id))
        {
            return Err(ModelError::UnknownTool {
                procedure: procedure.id().clone(),
                tool: tool.clone(),
            });
        }
        if let Some(resource) = procedure
            .required_resources()
            .iter()
            .find(|id| !self.resources.contains_key(*id))
        {
            return Err(ModelError::UnknownResource {
                procedure: procedure.id().clone(),
                resource: resource.clone(),
            });
        }
        Ok(())
    }
}

fn insert_unique<K, V>(map: &mut IndexMap<K, V>, key: K, value: V) -> Result<(), ModelError>
where
    K: Hash + Eq + std::fmt::Display,
{
    if map.contains_key(&key) {
        return Err(ModelError::DuplicateCatalogEntry(key.to_string()));
    }
    map.insert(key, value);
    Ok(())
}

impl TryFrom<CatalogDef> for Catalog {
    type Error = ModelError;

    fn try_from(def: CatalogDef) -> Result<Self, Self::Error> {
        let mut catalog = Self::new();
        for tool in def.tools {
            catalog.add_tool(tool)?;
        }
        for resource in def.resources {
            catalog.add_resource(resource)?;
        }
        Ok(catalog)
    }
}

impl From<Catalog> for CatalogDef {
    fn from(catalog: Catalog) -> Self {
        Self {
            tools: catalog.tools.into_values().collect(),
            resources: catalog.resources.into_values().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procedure::Step;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog
            .add_tool(ToolEntry::new("test_tube", "Test Tube", ItemCategory::Glassware))
            .unwrap();
        catalog
            .add_tool(ToolEntry::new("beaker", "Beaker", ItemCategory::Glassware))
            .unwrap();
        catalog
            .add_resource(ResourceEntry::new("fe", "Iron Filings", ItemCategory::Metal))
            .unwrap();
        catalog
            .add_resource(ResourceEntry::new("hcl", "Hydrochloric Acid", ItemCategory::Acid))
            .unwrap();
        catalog
            .add_resource(ResourceEntry::new("water", "Water", ItemCategory::Solvent))
            .unwrap();
        catalog
    }

    fn procedure(resource: &str) -> Procedure {
        Procedure::builder("p", "P")
            .step(Step::select_tool("Pick", "test_tube"))
            .step(Step::add_resource("Add", resource))
            .build()
            .unwrap()
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut catalog = catalog();
        let err = catalog
            .add_tool(ToolEntry::new("beaker", "Another Beaker", ItemCategory::Glassware))
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateCatalogEntry(id) if id == "beaker"));
    }

    #[test]
    fn offers_only_what_the_procedure_needs() {
        let catalog = catalog();
        let offered = catalog.offered_for(&procedure("fe"));
        let tools: Vec<_> = offered.tools.iter().map(|e| e.id.as_str()).collect();
        let resources: Vec<_> = offered.resources.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(tools, vec!["test_tube"]);
        assert_eq!(resources, vec!["fe"]);
    }

    #[test]
    fn unknown_resource_is_reported() {
        let catalog = catalog();
        assert!(catalog.check_procedure(&procedure("fe")).is_ok());
        let err = catalog.check_procedure(&procedure("zn")).unwrap_err();
        assert!(matches!(
            err,
            ModelError::UnknownResource { resource, .. } if resource.as_str() == "zn"
        ));
    }

    #[test]
    fn serialized_as_lists_in_order() {
        let json = serde_json::to_value(catalog()).unwrap();
        assert_eq!(json["tools"][0]["id"], "test_tube");
        assert_eq!(json["resources"][2]["category"], "solvent");
        let back: Catalog = serde_json::from_value(json).unwrap();
        assert_eq!(back.len(), 5);
    }
}

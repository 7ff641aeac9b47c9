//! The built-in catalog seed, embedded in the binary
//!
//! The base catalog is read-only input to the resolver. It is never persisted
//! and never exported; only the overlay on top of it is.

use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{AreaCore, Problem};

#[derive(Embed)]
#[folder = "assets/"]
struct Assets;

const CATALOG_FILE: &str = "catalog.yaml";

/// An area as it appears in the seed: core fields plus its member problems
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseArea {
    #[serde(flatten)]
    pub core: AreaCore,

    #[serde(default)]
    pub problems: Vec<Problem>,
}

#[derive(Debug, Clone, Deserialize)]
struct SeedFile {
    areas: Vec<BaseArea>,
}

/// The immutable built-in collection of areas and problems
#[derive(Debug, Clone)]
pub struct BaseCatalog {
    areas: Vec<BaseArea>,
}

impl BaseCatalog {
    /// Load the catalog embedded in the binary
    pub fn load_embedded() -> Result<Self, BaseCatalogError> {
        let file = Assets::get(CATALOG_FILE)
            .ok_or_else(|| BaseCatalogError::MissingAsset(CATALOG_FILE.to_string()))?;
        let raw = std::str::from_utf8(&file.data)
            .map_err(|e| BaseCatalogError::Parse(e.to_string()))?;
        Self::from_yaml(raw)
    }

    /// Parse a catalog from YAML (used by tests with small fixtures)
    pub fn from_yaml(raw: &str) -> Result<Self, BaseCatalogError> {
        let seed: SeedFile =
            serde_yml::from_str(raw).map_err(|e| BaseCatalogError::Parse(e.to_string()))?;
        Ok(Self { areas: seed.areas })
    }

    /// Build a catalog from already-parsed areas
    pub fn from_areas(areas: Vec<BaseArea>) -> Self {
        Self { areas }
    }

    /// Base areas in catalog order
    pub fn areas(&self) -> &[BaseArea] {
        &self.areas
    }

    pub fn area(&self, id: &str) -> Option<&BaseArea> {
        self.areas.iter().find(|a| a.core.id == id)
    }

    /// Look up a base problem anywhere in the catalog
    pub fn problem(&self, id: &str) -> Option<&Problem> {
        self.areas
            .iter()
            .flat_map(|a| a.problems.iter())
            .find(|p| p.id == id)
    }
}

/// Errors loading the embedded seed
#[derive(Debug, Error)]
pub enum BaseCatalogError {
    #[error("embedded catalog asset '{0}' is missing")]
    MissingAsset(String),

    #[error("failed to parse catalog seed: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_catalog_parses() {
        let catalog = BaseCatalog::load_embedded().unwrap();
        assert!(!catalog.areas().is_empty());

        // Every base problem id carries its area's code as prefix and points
        // back at its owning area.
        for area in catalog.areas() {
            assert!(!area.core.code.is_empty());
            for problem in &area.problems {
                assert!(
                    problem.id.starts_with(&format!("{}-", area.core.code)),
                    "problem {} does not match area code {}",
                    problem.id,
                    area.core.code
                );
                assert_eq!(problem.area_id, area.core.id);
                assert!(problem.cost.is_valid(), "bad cost range on {}", problem.id);
                assert!(problem.roi.is_valid(), "bad roi range on {}", problem.id);
            }
        }
    }

    #[test]
    fn test_problem_lookup() {
        let catalog = BaseCatalog::load_embedded().unwrap();
        let first = &catalog.areas()[0].problems[0];
        let found = catalog.problem(&first.id).unwrap();
        assert_eq!(found.title, first.title);
        assert!(catalog.problem("NOPE-1").is_none());
    }
}

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assemble::TestRecord;

/// Product details kept outside the scanned report, keyed by prescription number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub formulation: String,
    #[serde(default)]
    pub preservative_info: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductCatalog {
    #[serde(default)]
    pub products: BTreeMap<String, ProductInfo>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Read(String),
    #[error("Failed to parse catalog: {0}")]
    Parse(String),
}

/// A record together with the catalog entry for its prescription, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: TestRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductInfo>,
}

impl ProductCatalog {
    /// Load a catalog from YAML (JSON is accepted as a YAML subset).
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|e| CatalogError::Read(e.to_string()))?;
        let catalog: ProductCatalog = serde_yaml::from_str(&raw).map_err(|e| CatalogError::Parse(e.to_string()))?;
        tracing::info!(products = catalog.products.len(), path = %path.display(), "product catalog loaded");
        Ok(catalog)
    }

    pub fn lookup(&self, prescription_number: &str) -> Option<&ProductInfo> {
        let key = prescription_number.trim();
        if key.is_empty() {
            return None;
        }
        self.products.get(key)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Attach catalog entries by prescription number.
pub fn enrich(records: &[TestRecord], catalog: &ProductCatalog) -> Vec<EnrichedRecord> {
    records
        .iter()
        .map(|r| {
            let product = catalog.lookup(&r.prescription_number).cloned();
            if product.is_none() && !r.prescription_number.is_empty() && !catalog.is_empty() {
                tracing::warn!(prescription = %r.prescription_number, "prescription not in catalog");
            }
            EnrichedRecord { record: r.clone(), product }
        })
        .collect()
}

//! Normalization of OCR'd preservation-efficacy (challenge test) tables.
//!
//! A page arrives as a [`CellMatrix`] from one of the [`ingest`] adapters.
//! [`Extractor::extract_page`] locates the header, maps the columns, walks the
//! rows into [`TestRecord`]s and reads the sampling [`DateBlock`].

pub mod assemble;
pub mod catalog;
pub mod config;
pub mod dates;
pub mod extract;
pub mod files;
pub mod identifier;
pub mod ingest;
pub mod log_scale;
pub mod matrix;
pub mod strain;
pub mod structure;
pub mod value;

pub use assemble::{assemble, assemble_with, order_by_strain_within_tests, IdentifierContext, Judgment, TestRecord};
pub use catalog::{enrich, CatalogError, EnrichedRecord, ProductCatalog, ProductInfo};
pub use config::{load_config, parse_config, ConfigError, ExtractionConfig};
pub use dates::{extract_dates, extract_dates_with, DateBlock, DateSource};
pub use extract::{extract_page, Extractor, PageError, PageExtraction};
pub use files::{emit_files, enumerate_inputs, sha256_hex, EmitError, EmitPaths, EnumerateError};
pub use identifier::{extract_identifiers, Identifiers};
pub use ingest::{ingest, IngestError, InputFormat};
pub use log_scale::to_log10;
pub use matrix::{Cell, CellMatrix};
pub use strain::{normalize_strain, Strain};
pub use structure::{map_columns, resolve_header, ColumnMap, HeaderLocation, ScanLimits};
pub use value::{normalize_value, Day7Policy, DayColumn, ValueNormalizer};

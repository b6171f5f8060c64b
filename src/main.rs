use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use challenge_table::{
    emit_files, enrich, enumerate_inputs, ingest, load_config, sha256_hex, to_log10, DayColumn, EnumerateError,
    ExtractionConfig, Extractor, InputFormat, ProductCatalog,
};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// Serialized cell matrix ({"cells":[{"row","col","text"}]})
    Cells,
    /// Layout-analysis result with tables of indexed cells
    Layout,
    /// Document-parse result or a raw HTML table
    Html,
}

impl From<FormatArg> for InputFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Cells => InputFormat::Cells,
            FormatArg::Layout => InputFormat::Layout,
            FormatArg::Html => InputFormat::Html,
        }
    }
}

#[derive(Parser)]
#[command(name = "challenge-table")]
#[command(about = "Normalize OCR'd preservation-efficacy test tables into structured records")]
#[command(version)]
struct Cli {
    /// Shape of the OCR result files
    #[arg(long, value_enum, default_value = "layout")]
    format: FormatArg,

    /// Extraction config (YAML); defaults apply when omitted
    #[arg(short, long, env = "CHALLENGE_TABLE_CONFIG")]
    config: Option<PathBuf>,

    /// Product catalog keyed by prescription number (overrides the config entry)
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[arg(long, default_value = "./output")]
    out_dir: PathBuf,

    /// Exit with code 5 if any page could not be extracted
    #[arg(long)]
    strict: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Glob of OCR result files, one per page (e.g. "./ocr/**/*.json")
    input_glob: String,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "challenge_table=debug" } else { "challenge_table=warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // 1) Config
    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool": "load_config",
                        "file": path,
                        "error": e.to_string(),
                        "error_code": 3
                    })
                );
                std::process::exit(3);
            }
        },
        None => ExtractionConfig::default(),
    };
    eprintln!(
        "{}",
        serde_json::json!({
            "tool": "load_config",
            "file": cli.config,
            "status": "ok",
            "day7_policy": config.day7_policy,
            "reference_year": config.reference_year
        })
    );

    // 2) Optional product catalog
    let catalog_path = cli.catalog.clone().or_else(|| config.catalog.clone());
    let catalog = match &catalog_path {
        Some(path) => match ProductCatalog::load(path) {
            Ok(c) => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool": "load_catalog",
                        "file": path,
                        "products": c.len()
                    })
                );
                c
            }
            Err(e) => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool": "load_catalog",
                        "file": path,
                        "error": e.to_string(),
                        "error_code": 3
                    })
                );
                std::process::exit(3);
            }
        },
        None => ProductCatalog::default(),
    };

    // 3) Inputs
    let files = match enumerate_inputs(&cli.input_glob) {
        Ok(files) => files,
        Err(EnumerateError::NoFilesFound { guidance }) => {
            eprintln!(
                "{}",
                serde_json::json!({
                    "tool": "enumerate_inputs",
                    "error": "NoFilesFound",
                    "error_code": 1
                })
            );
            eprintln!("{}", guidance);
            std::process::exit(1);
        }
    };
    eprintln!("{}", serde_json::json!({"tool": "enumerate_inputs", "count": files.len()}));

    let extractor = Extractor::new(config);
    let format = InputFormat::from(cli.format);
    let mut used_stems: HashSet<String> = HashSet::new();
    let mut failed_pages: Vec<PathBuf> = Vec::new();

    for file in files {
        let stem = unique_stem(page_stem(&file), &mut used_stems);
        match process_page(&file, &stem, format, &extractor, &catalog, &cli.out_dir) {
            Ok(()) => {}
            Err(PageFailure::Skipped) => failed_pages.push(file),
            Err(PageFailure::WriteFailed) => std::process::exit(6),
        }
    }

    eprintln!(
        "{}",
        serde_json::json!({
            "tool": "summary",
            "failed_pages": failed_pages,
            "strict": cli.strict
        })
    );
    if cli.strict && !failed_pages.is_empty() {
        std::process::exit(5);
    }
}

enum PageFailure {
    /// Reported; the run continues with the next page.
    Skipped,
    WriteFailed,
}

fn serialize_failed(file: &Path, e: &serde_json::Error) -> PageFailure {
    eprintln!("{}", serde_json::json!({"tool": "serialize_result", "file": file, "error": e.to_string()}));
    PageFailure::Skipped
}

fn process_page(
    file: &Path,
    stem: &str,
    format: InputFormat,
    extractor: &Extractor,
    catalog: &ProductCatalog,
    out_dir: &Path,
) -> Result<(), PageFailure> {
    let raw = std::fs::read_to_string(file).map_err(|e| {
        eprintln!("{}", serde_json::json!({"tool": "read_input", "file": file, "error": e.to_string()}));
        PageFailure::Skipped
    })?;

    let matrix = ingest(&raw, format).map_err(|e| {
        eprintln!("{}", serde_json::json!({"tool": "ingest", "file": file, "error": e.to_string()}));
        PageFailure::Skipped
    })?;
    eprintln!(
        "{}",
        serde_json::json!({
            "tool": "ingest",
            "file": file,
            "rows": matrix.row_end(),
            "cells": matrix.cells().count()
        })
    );

    let page = extractor.extract_page(&matrix).map_err(|e| {
        eprintln!("{}", serde_json::json!({"tool": "extract_page", "file": file, "error": e.to_string()}));
        PageFailure::Skipped
    })?;
    eprintln!(
        "{}",
        serde_json::json!({
            "tool": "extract_page",
            "file": file,
            "header": page.header,
            "records": page.records.len(),
            "test_numbers": page.test_numbers(),
            "date_source": page.dates.source
        })
    );

    let enriched = enrich(&page.records, catalog);
    let mut records = Vec::with_capacity(enriched.len());
    for (er, rec) in enriched.iter().zip(&page.records) {
        let mut value = serde_json::to_value(er).map_err(|e| serialize_failed(file, &e))?;
        let log10: BTreeMap<String, String> =
            DayColumn::ALL.iter().map(|&d| (d.to_string(), to_log10(rec.cfu(d)))).collect();
        if let Some(obj) = value.as_object_mut() {
            obj.insert("cfu_log10".to_string(), serde_json::json!(log10));
        }
        records.push(value);
    }
    let result = serde_json::json!({
        "source": file,
        "dates": page.dates,
        "test_numbers": page.test_numbers(),
        "records": records
    });

    let result_bytes = serde_json::to_vec(&result).map_err(|e| serialize_failed(file, &e))?;
    let meta = serde_json::json!({
        "source": file,
        "format": format!("{:?}", format).to_lowercase(),
        "header": page.header,
        "columns": page.columns,
        "record_count": page.records.len(),
        "enriched": enriched.iter().filter(|r| r.product.is_some()).count(),
        "config": extractor.config(),
        "result_fingerprint": sha256_hex(&result_bytes)
    });

    match emit_files(&result, &meta, out_dir, stem) {
        Ok(paths) => {
            eprintln!(
                "{}",
                serde_json::json!({
                    "tool": "emit_files",
                    "file": file,
                    "records_path": paths.records_path,
                    "meta_path": paths.meta_path
                })
            );
            Ok(())
        }
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::json!({
                    "tool": "emit_files",
                    "file": file,
                    "error": e.to_string(),
                    "error_code": 6
                })
            );
            Err(PageFailure::WriteFailed)
        }
    }
}

fn page_stem(file: &Path) -> String {
    let base = file.file_stem().and_then(|s| s.to_str()).unwrap_or("page");
    let mut slug: String = base
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "page".to_string()
    } else {
        slug
    }
}

fn unique_stem(stem: String, used: &mut HashSet<String>) -> String {
    if used.insert(stem.clone()) {
        return stem;
    }
    let mut i = 1;
    loop {
        let candidate = format!("{}-{}", stem, i);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        i += 1;
    }
}

use std::path::{Path, PathBuf};

use globwalk::GlobWalkerBuilder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnumerateError {
    #[error("NoFilesFound")]
    NoFilesFound { guidance: String },
}

/// Enumerate OCR result files matching a glob (e.g. "./ocr/**/*.json"), sorted.
pub fn enumerate_inputs(glob_pattern: &str) -> Result<Vec<PathBuf>, EnumerateError> {
    let root = if Path::new(glob_pattern).is_absolute() { "/" } else { "." };
    let pat = glob_pattern.trim_start_matches("./");
    let mut paths: Vec<PathBuf> = GlobWalkerBuilder::from_patterns(root, &[pat])
        .case_insensitive(false)
        .follow_links(false)
        .build()
        .map_err(|_| EnumerateError::NoFilesFound { guidance: input_guidance(glob_pattern) })?
        .filter_map(Result::ok)
        .map(|e| e.path().to_path_buf())
        .collect();

    paths.retain(|p| p.is_file());
    paths.sort();

    if paths.is_empty() {
        return Err(EnumerateError::NoFilesFound { guidance: input_guidance(glob_pattern) });
    }
    Ok(paths)
}

fn input_guidance(glob_pattern: &str) -> String {
    format!(
        r#"No OCR result files match {glob_pattern}
Expected one file per page, for example:
  ./ocr/report-p1.json   (layout-analysis result, --format layout)
  ./ocr/report-p2.json   (document-parse result, --format html)
  ./ocr/report-p3.json   (cell list, --format cells)"#
    )
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("WriteFailed: {0}")]
    WriteFailed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitPaths {
    pub records_path: String,
    pub meta_path: String,
}

/// Atomically write the page result and its meta JSON into `outdir` under `stem`.
pub fn emit_files(
    result: &serde_json::Value,
    meta: &serde_json::Value,
    outdir: &Path,
    stem: &str,
) -> Result<EmitPaths, EmitError> {
    std::fs::create_dir_all(outdir).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    let records_path = outdir.join(format!("{}.records.json", stem));
    let meta_path = outdir.join(format!("{}.meta.json", stem));

    write_atomic(&records_path, result)?;
    write_atomic(&meta_path, meta)?;

    Ok(EmitPaths {
        records_path: records_path.to_string_lossy().to_string(),
        meta_path: meta_path.to_string_lossy().to_string(),
    })
}

fn write_atomic(path: &Path, value: &serde_json::Value) -> Result<(), EmitError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".tmp.{}", std::process::id()));
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| EmitError::WriteFailed(e.to_string()))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect()
}

//! Shift_JIS to UTF-8 conversion for spreadsheet exports.

use std::fs;
use std::path::{Path, PathBuf};

use encoding_rs::SHIFT_JIS;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Result, SyncError};

/// One converted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedFile {
    pub input: PathBuf,
    pub output: PathBuf,
    /// True when some bytes could not be decoded and were replaced.
    pub had_errors: bool,
}

/// Decode Shift_JIS bytes. Undecodable sequences become U+FFFD.
pub fn decode_shift_jis(bytes: &[u8]) -> (String, bool) {
    let (text, _, had_errors) = SHIFT_JIS.decode(bytes);
    (text.into_owned(), had_errors)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Convert every `*.csv` file directly under `input` into `output`.
///
/// Files are processed in name order; `output` is created if needed.
pub fn convert_directory(input: &Path, output: &Path) -> Result<Vec<ConvertedFile>> {
    if !input.is_dir() {
        return Err(SyncError::InvalidInput(format!(
            "input directory not found: {}",
            input.display()
        )));
    }
    fs::create_dir_all(output)?;

    let mut sources: Vec<PathBuf> = fs::read_dir(input)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_csv(path))
        .collect();
    sources.sort();

    let mut converted = Vec::with_capacity(sources.len());
    for source in sources {
        let Some(name) = source.file_name() else {
            continue;
        };
        let target = output.join(name);
        let bytes = fs::read(&source)?;
        let (text, had_errors) = decode_shift_jis(&bytes);
        if had_errors {
            warn!(file = %source.display(), "Undecodable bytes replaced");
        }
        fs::write(&target, text)?;
        info!(from = %source.display(), to = %target.display(), "Converted");
        converted.push(ConvertedFile {
            input: source,
            output: target,
            had_errors,
        });
    }
    Ok(converted)
}

//! Catalog CSV import checks.
//!
//! The backend parses the CSV; only the size limit and the header row are
//! checked here so an obviously wrong file fails fast with a useful message.

use thiserror::Error;

/// Largest CSV accepted for upload.
pub const MAX_CSV_BYTES: usize = 5 * 1024 * 1024;

/// Columns the backend expects, in order.
pub const EXPECTED_COLUMNS: [&str; 8] = [
    "id",
    "name",
    "description",
    "price",
    "category",
    "image_main",
    "image_sub1",
    "image_sub2",
];

/// Reasons a CSV is refused before upload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("file is empty")]
    Empty,

    #[error("file is {size} bytes, the limit is {MAX_CSV_BYTES}")]
    TooLarge { size: usize },

    #[error("file is not valid UTF-8")]
    NotUtf8,

    #[error("unexpected header: missing column(s) {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),
}

/// Check a CSV before upload.
///
/// # Errors
///
/// Returns an [`ImportError`] describing the first problem found.
pub fn validate_csv(contents: &[u8]) -> Result<(), ImportError> {
    if contents.is_empty() {
        return Err(ImportError::Empty);
    }
    if contents.len() > MAX_CSV_BYTES {
        return Err(ImportError::TooLarge {
            size: contents.len(),
        });
    }

    let text = std::str::from_utf8(contents).map_err(|_| ImportError::NotUtf8)?;
    let header = text
        .trim_start_matches('\u{feff}')
        .lines()
        .next()
        .unwrap_or_default();

    let columns: Vec<String> = header
        .split([',', ';'])
        .map(|c| c.trim().trim_matches('"').to_ascii_lowercase())
        .collect();

    let missing: Vec<&'static str> = EXPECTED_COLUMNS
        .into_iter()
        .filter(|expected| !columns.iter().any(|c| c == expected))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ImportError::MissingColumns(missing))
    }
}

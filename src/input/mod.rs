//! Input files: CSV rows and encoding conversion.

pub mod encoding;
pub mod rows;

pub use encoding::{ConvertedFile, convert_directory};
pub use rows::{CsvRow, read_rows};

//! Hex image loaders.
//!
//! Instruction memories and the main-memory image arrive as text files with
//! one 8-digit hex word per line, loaded in order from address 0. Short files
//! zero-fill the remainder; blank lines are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::common::SimError;

/// Loads up to `limit` words from the hex file at `path`.
///
/// # Errors
///
/// Returns [`SimError::OpenInput`] when the file cannot be opened and
/// [`SimError::BadHexWord`] for a line that does not parse as a hex word.
pub fn load_hex_words(path: &Path, limit: usize) -> Result<Vec<u32>, SimError> {
    let file = File::open(path).map_err(|source| SimError::OpenInput {
        path: path.to_path_buf(),
        source,
    })?;

    let mut words = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let word = u32::from_str_radix(text, 16).map_err(|_| SimError::BadHexWord {
            path: path.to_path_buf(),
            line: idx + 1,
        })?;
        words.push(word);
        if words.len() == limit {
            break;
        }
    }
    Ok(words)
}

//! File Fingerprinting
//!
//! Content hash of a table file for drift detection between what is on disk
//! and what the descriptor asserts.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

/// Streaming SHA-256 of a file's contents.
///
/// A missing file hashes to the empty string, matching the descriptor
/// convention for datasets that have not been written yet.
pub fn file_sha256(path: &Path) -> Result<String> {
    if !path.exists() {
        return Ok(String::new());
    }

    let mut file = File::open(path)
        .map_err(|e| Error::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 4096];

    loop {
        let read = file
            .read(&mut buffer)
            .map_err(|e| Error::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

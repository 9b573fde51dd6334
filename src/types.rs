use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Caller-supplied hint telling the hasher how to treat a value.
///
/// The same path string hashes differently depending on this hint:
/// `Opaque` hashes the text itself, `File`/`Directory` hash what is on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeclaredType {
    #[default]
    Opaque,
    File,
    Directory,
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredType::Opaque => f.write_str("opaque data"),
            DeclaredType::File => f.write_str("a file"),
            DeclaredType::Directory => f.write_str("a directory"),
        }
    }
}

/// Digest algorithm used for file, directory and cache-key digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Blake3,
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "blake3" => Ok(HashAlgorithm::Blake3),
            other => Err(format!(
                "invalid hash algorithm: {other} (expected \"sha256\" or \"blake3\")"
            )),
        }
    }
}

/// Where the driver keeps the last successful input digest of each task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Store digests in memory only (lost when the process exits).
    #[default]
    Memory,
    /// Store digests in `.workdag/cache` under the workflow root.
    File,
}

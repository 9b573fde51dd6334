// src/hash/mod.rs

//! Content hashing for cache keys.
//!
//! - [`value`] defines the hashable [`Value`] shapes and their [`Canonical`]
//!   forms.
//! - [`content`] holds [`ContentHasher`], which turns values, files and
//!   directories into digests.
//! - [`digest`] wraps the supported digest algorithms.
//!
//! The free functions below use a default hasher (SHA-256, real
//! filesystem, hidden entries included).

use std::path::Path;

use crate::errors::HashError;
use crate::types::DeclaredType;

pub mod content;
pub mod digest;
pub mod value;

pub use content::{ContentHasher, HashOptions};
pub use digest::{Digester, digest_bytes};
pub use value::{Canonical, ExactFloat, Value};

/// Canonical form of `value`; see [`ContentHasher::hash_value`].
pub fn hash_value(value: &Value, declared: DeclaredType) -> Result<Canonical, HashError> {
    ContentHasher::new(HashOptions::default()).hash_value(value, declared)
}

/// Cache-key digest of `value` treated as opaque data.
pub fn hash_function(value: &Value) -> Result<String, HashError> {
    ContentHasher::new(HashOptions::default()).hash_function(value, DeclaredType::Opaque)
}

/// Digest of a file's bytes.
pub fn hash_file(path: impl AsRef<Path>) -> Result<String, HashError> {
    ContentHasher::new(HashOptions::default()).hash_file(path.as_ref())
}

/// Digest of a directory tree; see [`ContentHasher::hash_dir`].
pub fn hash_dir(
    path: impl AsRef<Path>,
    ignore_hidden_dirs: bool,
    ignore_hidden_files: bool,
) -> Result<String, HashError> {
    ContentHasher::new(HashOptions::default()).hash_dir(
        path.as_ref(),
        ignore_hidden_dirs,
        ignore_hidden_files,
    )
}

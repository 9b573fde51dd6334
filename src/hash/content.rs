// src/hash/content.rs

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::errors::HashError;
use crate::fs::{FileSystem, RealFileSystem};
use crate::hash::digest::{Digester, digest_bytes};
use crate::hash::value::{Canonical, ExactFloat, Value};
use crate::types::{DeclaredType, HashAlgorithm};

/// Settings shared by every digest a [`ContentHasher`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HashOptions {
    pub algorithm: HashAlgorithm,
    /// Used when a value declared as a directory is hashed.
    pub ignore_hidden_dirs: bool,
    /// Used when a value declared as a directory is hashed.
    pub ignore_hidden_files: bool,
}

/// Deterministic content hasher for task inputs.
///
/// Holds no mutable state; share it across threads behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ContentHasher<F: FileSystem = RealFileSystem> {
    fs: F,
    options: HashOptions,
}

impl ContentHasher<RealFileSystem> {
    pub fn new(options: HashOptions) -> Self {
        Self::with_fs(RealFileSystem, options)
    }
}

impl<F: FileSystem> ContentHasher<F> {
    pub fn with_fs(fs: F, options: HashOptions) -> Self {
        Self { fs, options }
    }

    pub fn options(&self) -> HashOptions {
        self.options
    }

    /// Canonical form of `value`.
    ///
    /// Sequences and mappings are walked recursively and `declared` applies
    /// to every leaf: a `File`/`Directory` leaf must be a path string and is
    /// replaced by the digest of what it points to.
    pub fn hash_value(&self, value: &Value, declared: DeclaredType) -> Result<Canonical, HashError> {
        match value {
            Value::List(items) | Value::Tuple(items) => items
                .iter()
                .map(|item| self.hash_value(item, declared))
                .collect::<Result<Vec<_>, _>>()
                .map(Canonical::Seq),
            Value::Map(entries) => {
                let mut pairs = entries
                    .iter()
                    .map(|(key, item)| Ok((key.clone(), self.hash_value(item, declared)?)))
                    .collect::<Result<Vec<_>, HashError>>()?;
                pairs.sort_by(|a, b| a.0.cmp(&b.0));
                Ok(Canonical::Pairs(pairs))
            }
            scalar => match (declared, scalar) {
                (DeclaredType::Opaque, _) => Self::canonical_scalar(scalar),
                (DeclaredType::File, Value::Str(path)) => {
                    Ok(Canonical::Digest(self.hash_file(Path::new(path))?))
                }
                (DeclaredType::Directory, Value::Str(path)) => Ok(Canonical::Digest(self.hash_dir(
                    Path::new(path),
                    self.options.ignore_hidden_dirs,
                    self.options.ignore_hidden_files,
                )?)),
                (declared, other) => Err(HashError::DeclaredTypeMismatch {
                    declared,
                    found: other.kind(),
                }),
            },
        }
    }

    /// Final cache-key digest of a single value.
    pub fn hash_function(&self, value: &Value, declared: DeclaredType) -> Result<String, HashError> {
        let canonical = self.hash_value(value, declared)?;
        self.digest_canonical(&canonical)
    }

    /// Cache-key digest over a set of named inputs, independent of their
    /// order.
    pub fn hash_inputs<'a, I>(&self, inputs: I) -> Result<String, HashError>
    where
        I: IntoIterator<Item = (&'a str, &'a Value, DeclaredType)>,
    {
        let mut pairs = inputs
            .into_iter()
            .map(|(name, value, declared)| Ok((name.to_string(), self.hash_value(value, declared)?)))
            .collect::<Result<Vec<_>, HashError>>()?;
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        self.digest_canonical(&Canonical::Pairs(pairs))
    }

    /// Digest of a canonical form (over its JSON rendering).
    pub fn digest_canonical(&self, canonical: &Canonical) -> Result<String, HashError> {
        let bytes = serde_json::to_vec(canonical)?;
        Ok(digest_bytes(self.options.algorithm, &bytes))
    }

    /// Digest of a file's bytes. Metadata does not participate.
    pub fn hash_file(&self, path: &Path) -> Result<String, HashError> {
        if !self.fs.exists(path) {
            return Err(HashError::FileNotFound(path.to_path_buf()));
        }
        if !self.fs.is_file(path) {
            return Err(HashError::NotAFile(path.to_path_buf()));
        }

        let mut reader = self
            .fs
            .open_read(path)
            .map_err(|e| file_io_error(path, e))?;
        let mut digester = Digester::new(self.options.algorithm);
        io::copy(&mut reader, &mut digester).map_err(|e| file_io_error(path, e))?;

        let digest = digester.finalize_hex();
        trace!(path = ?path, digest = %digest, "hashed file");
        Ok(digest)
    }

    /// Digest of every included file under `path`.
    ///
    /// Files are visited depth-first: a directory's files sorted by name,
    /// then its subdirectories sorted by name, so the result does not depend
    /// on listing order. Entries whose name starts with `.` are skipped when
    /// the matching flag is set; a skipped directory takes its whole subtree
    /// with it. Symlinked directories are not descended into.
    pub fn hash_dir(
        &self,
        path: &Path,
        ignore_hidden_dirs: bool,
        ignore_hidden_files: bool,
    ) -> Result<String, HashError> {
        if !self.fs.exists(path) {
            return Err(HashError::DirectoryNotFound(path.to_path_buf()));
        }
        if !self.fs.is_dir(path) {
            return Err(HashError::NotADirectory(path.to_path_buf()));
        }

        let filter = HiddenFilter {
            dirs: ignore_hidden_dirs,
            files: ignore_hidden_files,
        };
        let mut files = Vec::new();
        self.collect_files(path, filter, &mut files)?;

        let mut digester = Digester::new(self.options.algorithm);
        for file in &files {
            let file_hash = self.hash_file(file)?;
            digester.update(file_hash.as_bytes());
        }

        let digest = digester.finalize_hex();
        debug!(
            path = ?path,
            files = files.len(),
            ignore_hidden_dirs,
            ignore_hidden_files,
            digest = %digest,
            "hashed directory"
        );
        Ok(digest)
    }

    fn collect_files(
        &self,
        dir: &Path,
        filter: HiddenFilter,
        out: &mut Vec<PathBuf>,
    ) -> Result<(), HashError> {
        let mut entries = self.fs.read_dir(dir).map_err(|e| dir_io_error(dir, e))?;
        entries.sort();

        let mut subdirs = Vec::new();
        for entry in entries {
            if self.fs.is_dir(&entry) {
                if filter.dirs && is_hidden(&entry) {
                    trace!(path = ?entry, "skipping hidden directory");
                } else if !self.fs.is_symlink(&entry) {
                    subdirs.push(entry);
                }
            } else if self.fs.is_file(&entry) {
                if filter.files && is_hidden(&entry) {
                    trace!(path = ?entry, "skipping hidden file");
                } else {
                    out.push(entry);
                }
            }
        }

        for subdir in subdirs {
            self.collect_files(&subdir, filter, out)?;
        }
        Ok(())
    }

    fn canonical_scalar(value: &Value) -> Result<Canonical, HashError> {
        Ok(match value {
            Value::Null => Canonical::Null,
            Value::Bool(b) => Canonical::Bool(*b),
            Value::Int(i) => Canonical::Int(*i),
            Value::Float(f) => Canonical::Float(ExactFloat::from_f64(*f)?),
            Value::Str(s) => Canonical::Str(s.clone()),
            Value::List(_) | Value::Tuple(_) | Value::Map(_) => {
                return Err(HashError::DeclaredTypeMismatch {
                    declared: DeclaredType::Opaque,
                    found: value.kind(),
                });
            }
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct HiddenFilter {
    dirs: bool,
    files: bool,
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.as_encoded_bytes().first() == Some(&b'.'))
}

fn file_io_error(path: &Path, source: io::Error) -> HashError {
    if source.kind() == io::ErrorKind::NotFound {
        HashError::FileNotFound(path.to_path_buf())
    } else {
        HashError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn dir_io_error(path: &Path, source: io::Error) -> HashError {
    if source.kind() == io::ErrorKind::NotFound {
        HashError::DirectoryNotFound(path.to_path_buf())
    } else {
        HashError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

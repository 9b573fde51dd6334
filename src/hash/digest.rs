// src/hash/digest.rs

use std::io;

use sha2::{Digest, Sha256};

use crate::types::HashAlgorithm;

/// Incremental digest over one of the supported algorithms.
///
/// Implements [`io::Write`] so readers can be streamed in with
/// [`io::copy`].
pub enum Digester {
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl Digester {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Digester::Sha256(Sha256::new()),
            HashAlgorithm::Blake3 => Digester::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        match self {
            Digester::Sha256(hasher) => hasher.update(bytes),
            Digester::Blake3(hasher) => {
                hasher.update(bytes);
            }
        }
    }

    /// Finish and render the digest as lowercase hex.
    pub fn finalize_hex(self) -> String {
        match self {
            Digester::Sha256(hasher) => hex::encode(hasher.finalize()),
            Digester::Blake3(hasher) => hasher.finalize().to_hex().to_string(),
        }
    }
}

impl io::Write for Digester {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// One-shot digest of a byte slice.
pub fn digest_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> String {
    let mut digester = Digester::new(algorithm);
    digester.update(bytes);
    digester.finalize_hex()
}

//! Streaming content hasher.
//!
//! # Overview
//!
//! [`Hasher`] computes a 32-byte [`Digest`] for a single file by feeding
//! fixed-size blocks into an incremental hash state. Files are never loaded
//! into memory whole, so arbitrarily large files hash in constant memory.
//!
//! Two algorithms are supported:
//! - SHA-256 (default): digests match reports written by earlier tooling
//! - BLAKE3: considerably faster on large trees
//!
//! # Example
//!
//! ```no_run
//! use dupesieve::scanner::{HashAlgorithm, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new(HashAlgorithm::Sha256);
//! match hasher.hash_file(Path::new("some/file.bin")) {
//!     Ok(digest) => println!("{digest}"),
//!     Err(e) => eprintln!("skipped: {e}"),
//! }
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::Digest as _;

use super::HashError;

/// Size of each read fed into the hash state.
pub const BLOCK_SIZE: usize = 8 * 1024;

/// Content digest of a file.
///
/// Only used as an equality and ordering key. The textual form is 64
/// lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Wrap raw digest bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hexadecimal representation.
    #[must_use]
    pub fn to_hex(&self) -> String {
        use fmt::Write;
        self.0.iter().fold(String::with_capacity(64), |mut out, b| {
            let _ = write!(out, "{b:02x}");
            out
        })
    }

    /// Parse a 64-character hex string (either case).
    ///
    /// Returns `None` for any other length or a non-hex character.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hash algorithm used to compute digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256
    #[default]
    Sha256,
    /// BLAKE3
    Blake3,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            other => Err(format!("Unknown hash algorithm: '{other}'")),
        }
    }
}

/// Incremental hash state for one file.
enum HashState {
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl HashState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, block: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(block),
            Self::Blake3(h) => {
                h.update(block);
            }
        }
    }

    fn finalize(self) -> Digest {
        match self {
            Self::Sha256(h) => Digest(h.finalize().into()),
            Self::Blake3(h) => Digest(*h.finalize().as_bytes()),
        }
    }
}

/// Streaming file hasher.
///
/// Cheap to construct and `Sync`, so one instance is shared by every
/// worker of the hash pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hasher {
    algorithm: HashAlgorithm,
}

impl Hasher {
    /// Create a hasher for the given algorithm.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// The algorithm this hasher uses.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash the full content of a file.
    ///
    /// Reads [`BLOCK_SIZE`] bytes at a time until end of file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] tagged with `path` if the file cannot be opened
    /// or a read fails part-way.
    pub fn hash_file(&self, path: &Path) -> Result<Digest, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        self.hash_reader(file).map_err(|e| HashError::from_io(path, e))
    }

    /// Hash everything readable from `reader`.
    ///
    /// # Errors
    ///
    /// Propagates any read error other than `Interrupted`.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> io::Result<Digest> {
        let mut state = HashState::new(self.algorithm);
        let mut buffer = [0u8; BLOCK_SIZE];

        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            state.update(&buffer[..read]);
        }

        Ok(state.finalize())
    }

    /// Hash an in-memory byte slice.
    #[must_use]
    pub fn hash_bytes(&self, bytes: &[u8]) -> Digest {
        let mut state = HashState::new(self.algorithm);
        state.update(bytes);
        state.finalize()
    }
}

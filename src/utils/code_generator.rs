//! Deterministic short code derivation.
//!
//! Codes are derived from the URL itself rather than generated randomly, so the
//! same URL always maps to the same code on every process and machine. This is
//! what makes shortening idempotent without a reverse index.

use base64::Engine as _;
use md5::{Digest, Md5};

/// Default code length.
pub const DEFAULT_CODE_LENGTH: usize = 7;

/// Longest code the derivation can yield: 16 digest bytes encode to 22 base64
/// characters before padding.
pub const MAX_CODE_LENGTH: usize = 22;

/// Maximum length accepted when resolving a code.
const MAX_LOOKUP_LENGTH: usize = 32;

/// Derives short codes from URLs.
///
/// The production implementation is [`HashCodeGenerator`]; tests substitute
/// fixed generators to force collisions between distinct URLs.
pub trait CodeGenerator: Send + Sync {
    /// Derives the short code for `url`. Total over all inputs, never fails.
    fn derive(&self, url: &str) -> String;
}

/// MD5-based generator truncating to a fixed length.
#[derive(Debug, Clone, Copy)]
pub struct HashCodeGenerator {
    length: usize,
}

impl HashCodeGenerator {
    /// Creates a generator producing codes of `length` characters.
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    /// Returns the configured code length.
    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for HashCodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}

impl CodeGenerator for HashCodeGenerator {
    fn derive(&self, url: &str) -> String {
        derive_code(url, self.length)
    }
}

/// Derives a short code from the UTF-8 bytes of `url`.
///
/// # Algorithm
///
/// 1. MD5 digest of the input bytes (128 bits)
/// 2. URL-safe base64 encoding
/// 3. Keep only ASCII letters and digits (drops `-`, `_` and `=` padding)
/// 4. Take the first `length` characters
///
/// If fewer than `length` alphanumeric characters survive the filter, the
/// shorter code is returned as-is. This needs most of the 22 encoded
/// characters to be `-` or `_` and is accepted rather than treated as an error.
///
/// # Examples
///
/// ```
/// use clck::utils::code_generator::derive_code;
///
/// assert_eq!(derive_code("https://example.com/a/b", 7), "A8SlAtQ");
/// ```
pub fn derive_code(url: &str, length: usize) -> String {
    let digest = Md5::digest(url.as_bytes());
    let encoded = base64::engine::general_purpose::URL_SAFE.encode(digest);

    encoded
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(length)
        .collect()
}

/// Checks whether `code` could have been issued by this service.
///
/// Used to reject garbage on the resolve path without a store round-trip.
pub fn is_valid_short_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_LOOKUP_LENGTH
        && code.chars().all(|c| c.is_ascii_alphanumeric())
}

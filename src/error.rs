//! Error types for KEF envelopes, BBQr transport, the deflate codec, and
//! mnemonic-QR coding.
//!
//! All fallible operations in this crate return `Result<T, Error>`. The
//! error kinds form a small closed set and never carry heap-owned secret
//! data — only structural context (offsets, byte counts, the version or
//! encoding byte that was rejected).
//!
//! ```rust,no_run
//! use kefqr::{Error, Result};
//!
//! fn open(data: &[u8]) -> Result<()> {
//!     match kefqr::crypto::kef::is_envelope(data) {
//!         true => Ok(()),
//!         false => Err(Error::InvalidArgument("not a KEF envelope")),
//!     }
//! }
//! ```

/// The error type for all operations in this crate.
///
/// Errors are recovered only by the immediate caller; cross-module calls
/// simply propagate. On any error the function that raised it is
/// responsible for having zeroized every secret buffer it allocated,
/// including intermediates that never reached the caller.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Missing or structurally bad input: a null/zero-length buffer, an
    /// out-of-range `id_len`, an empty password, or similar caller error.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The KEF version byte does not match any row of the version table.
    #[error("unsupported KEF version: {0}")]
    UnsupportedVersion(u8),

    /// The buffer is shorter than the envelope's declared framing requires.
    #[error("KEF envelope too short: need at least {needed} bytes, have {have}")]
    EnvelopeTooShort {
        /// Minimum byte length implied by the parsed header.
        needed: usize,
        /// Actual buffer length.
        have: usize,
    },

    /// Hidden-auth mismatch, exposed-auth mismatch, GCM tag mismatch, or
    /// malformed PKCS#7 padding.
    #[error("authentication failed")]
    Auth,

    /// An ECB-mode plaintext produced two identical 16-byte blocks after
    /// padding; the encoder refuses to emit such an envelope.
    #[error("duplicate 16-byte ciphertext blocks under ECB")]
    DuplicateBlocks,

    /// The underlying cipher primitive failed (buffer size mismatch,
    /// invalid key length, invalid internal state).
    #[error("cryptographic primitive failure: {0}")]
    Crypto(&'static str),

    /// Deflate compression failed while building a KEF or BBQr payload.
    #[error("compression failed: {0}")]
    Compress(&'static str),

    /// Deflate decompression failed while recovering a KEF or BBQr payload.
    #[error("decompression failed: {0}")]
    Decompress(&'static str),

    /// Allocation failure.
    #[error("allocation failure")]
    Alloc,

    /// The caller-provided output buffer for a deflate operation was too
    /// small; retryable by doubling the buffer.
    #[error("buffer too small")]
    BufferError,

    /// The deflate bit stream is malformed (bad block type, bad Huffman
    /// code, stored-block length mismatch).
    #[error("malformed deflate stream: {0}")]
    DataError(&'static str),

    /// A BBQr header or a base-encoded string is structurally invalid, or
    /// a mnemonic failed its BIP-39 checksum.
    #[error("bad format: {0}")]
    BadFormat(&'static str),
}

impl Error {
    pub(crate) fn envelope_too_short(needed: usize, have: usize) -> Self {
        Error::EnvelopeTooShort { needed, have }
    }
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

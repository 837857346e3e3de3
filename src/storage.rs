//! Storage framing: sanitized-ID normalization and the SPIFFS-raw vs.
//! SD-base64 KEF wrapping contracts.
//!
//! Only the pure naming/sanitization/wrapping functions are implemented
//! here; there is no filesystem or SD-card driver.

use base64::Engine;
use sha2::{Digest, Sha256};

use crate::{Error, Result};

const MAX_SANITIZED_LEN: usize = 24;
const INVALID_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|', ' '];

/// What an item represents, selecting its filename prefix/extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// A mnemonic, persisted as a KEF envelope (`m_<id>.kef`).
    Mnemonic,
    /// A descriptor, persisted either as a KEF envelope (`d_<id>.kef`) or
    /// plaintext (`d_<id>.txt`).
    Descriptor,
}

/// Where an item is persisted, selecting the KEF-wrapping contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medium {
    /// Internal flash: KEF envelopes stored as raw bytes.
    Spiffs,
    /// SD card: KEF envelopes base64-wrapped.
    SdCard,
}

/// Normalizes `id` into a filesystem-safe string.
///
/// Replaces any of `` \ / : * ? " < > | `` or space with `_`, strips
/// leading/trailing whitespace and dots, collapses runs of `_`, truncates
/// to 24 characters, and falls back to the first 8 uppercase hex
/// characters of `SHA-256(id)` if the result is empty.
pub fn sanitize_id(id: &str) -> String {
    let trimmed = id.trim_matches(|c: char| c.is_whitespace() || c == '.');

    let replaced: String = trimmed
        .chars()
        .map(|c| if INVALID_CHARS.contains(&c) { '_' } else { c })
        .collect();

    let mut collapsed = String::with_capacity(replaced.len());
    let mut prev_underscore = false;
    for c in replaced.chars() {
        if c == '_' {
            if !prev_underscore {
                collapsed.push(c);
            }
            prev_underscore = true;
        } else {
            collapsed.push(c);
            prev_underscore = false;
        }
    }

    let truncated: String = collapsed.chars().take(MAX_SANITIZED_LEN).collect();

    if truncated.is_empty() {
        let digest = Sha256::digest(id.as_bytes());
        let hex = digest.iter().map(|b| format!("{:02X}", b)).collect::<String>();
        hex.chars().take(8).collect()
    } else {
        truncated
    }
}

/// Builds the persisted filename for `id`/`kind` on `medium`
/// `m_<sanitized_id>.kef` for mnemonics (always KEF, on
/// either medium); `d_<sanitized_id>.kef` for descriptors on KEF-wrapped
/// storage, or `d_<sanitized_id>.txt` for plaintext descriptors.
pub fn build_filename(id: &str, kind: ItemKind, descriptor_is_plaintext: bool) -> String {
    let sanitized = sanitize_id(id);
    match kind {
        ItemKind::Mnemonic => format!("m_{sanitized}.kef"),
        ItemKind::Descriptor => {
            if descriptor_is_plaintext {
                format!("d_{sanitized}.txt")
            } else {
                format!("d_{sanitized}.kef")
            }
        }
    }
}

/// Wraps a KEF envelope for persistence on `medium`: raw bytes for
/// [`Medium::Spiffs`], standard RFC 4648 base64 for [`Medium::SdCard`].
pub fn wrap_envelope(envelope: &[u8], medium: Medium) -> Vec<u8> {
    match medium {
        Medium::Spiffs => envelope.to_vec(),
        Medium::SdCard => base64::engine::general_purpose::STANDARD
            .encode(envelope)
            .into_bytes(),
    }
}

/// Reverses [`wrap_envelope`], recovering the raw KEF envelope bytes.
pub fn unwrap_envelope(stored: &[u8], medium: Medium) -> Result<Vec<u8>> {
    match medium {
        Medium::Spiffs => Ok(stored.to_vec()),
        Medium::SdCard => {
            let text = std::str::from_utf8(stored)
                .map_err(|_| Error::BadFormat("SD-card KEF wrapper is not valid UTF-8"))?;
            base64::engine::general_purpose::STANDARD
                .decode(text)
                .map_err(|_| Error::BadFormat("SD-card KEF wrapper is not valid base64"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_invalid_characters() {
        assert_eq!(sanitize_id("a/b:c*d?e\"f<g>h|i j"), "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn sanitize_strips_leading_trailing_dots_and_whitespace() {
        assert_eq!(sanitize_id("  ..my-id..  "), "my-id");
    }

    #[test]
    fn sanitize_collapses_runs_of_underscore() {
        assert_eq!(sanitize_id("a   b"), "a_b");
    }

    #[test]
    fn sanitize_truncates_to_24_chars() {
        let long = "a".repeat(40);
        assert_eq!(sanitize_id(&long).len(), 24);
    }

    #[test]
    fn sanitize_falls_back_to_sha256_prefix_when_empty() {
        let result = sanitize_id("...");
        assert_eq!(result.len(), 8);
        assert!(result.chars().all(|c| c.is_ascii_hexdigit() && (c.is_ascii_digit() || c.is_uppercase())));
    }

    #[test]
    fn build_filename_contracts() {
        assert_eq!(build_filename("73C5DA0A", ItemKind::Mnemonic, false), "m_73C5DA0A.kef");
        assert_eq!(build_filename("73C5DA0A", ItemKind::Descriptor, false), "d_73C5DA0A.kef");
        assert_eq!(build_filename("73C5DA0A", ItemKind::Descriptor, true), "d_73C5DA0A.txt");
    }

    #[test]
    fn sd_card_wrapping_round_trips() {
        let envelope = b"not a real envelope, just bytes".to_vec();
        let wrapped = wrap_envelope(&envelope, Medium::SdCard);
        assert_ne!(wrapped, envelope);
        let unwrapped = unwrap_envelope(&wrapped, Medium::SdCard).unwrap();
        assert_eq!(unwrapped, envelope);
    }

    #[test]
    fn spiffs_wrapping_is_identity() {
        let envelope = b"raw bytes on flash".to_vec();
        let wrapped = wrap_envelope(&envelope, Medium::Spiffs);
        assert_eq!(wrapped, envelope);
    }
}

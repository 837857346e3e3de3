//! BBQr: a chunked, header-framed transport for splitting binary payloads
//! across QR codes and reassembling them.
//!
//! The 8-byte
//! part header, the hex/base32/base32+deflate payload encodings, the
//! zlib-header probe on `'Z'` decode, and the `payload_per_part` sizing
//! rule for `encode`.

use crate::codec::{base32, base36, deflate};
use crate::{Error, Result};

const MAGIC: &[u8; 2] = b"B$";

/// How a BBQr payload string is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Hex (`'H'`).
    Hex,
    /// Base32, RFC 4648 (`'2'`).
    Base32,
    /// Base32 over raw-deflated bytes (`'Z'`).
    Base32Deflate,
}

impl Encoding {
    fn to_byte(self) -> u8 {
        match self {
            Encoding::Hex => b'H',
            Encoding::Base32 => b'2',
            Encoding::Base32Deflate => b'Z',
        }
    }

    fn from_byte(b: u8) -> Result<Self> {
        match b {
            b'H' => Ok(Encoding::Hex),
            b'2' => Ok(Encoding::Base32),
            b'Z' => Ok(Encoding::Base32Deflate),
            _ => Err(Error::BadFormat("unrecognized BBQr encoding byte")),
        }
    }
}

/// The kind of file a BBQr payload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// PSBT (`'P'`).
    Psbt,
    /// Raw transaction (`'T'`).
    Transaction,
    /// JSON (`'J'`).
    Json,
    /// Unicode text (`'U'`).
    UnicodeText,
}

impl FileType {
    fn to_byte(self) -> u8 {
        match self {
            FileType::Psbt => b'P',
            FileType::Transaction => b'T',
            FileType::Json => b'J',
            FileType::UnicodeText => b'U',
        }
    }

    fn from_byte(b: u8) -> Result<Self> {
        match b {
            b'P' => Ok(FileType::Psbt),
            b'T' => Ok(FileType::Transaction),
            b'J' => Ok(FileType::Json),
            b'U' => Ok(FileType::UnicodeText),
            _ => Err(Error::BadFormat("unrecognized BBQr file type byte")),
        }
    }
}

/// One parsed BBQr part: `"B$" | encoding | file_type | total | index | payload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Payload string encoding.
    pub encoding: Encoding,
    /// Payload file type.
    pub file_type: FileType,
    /// Total number of parts in this transfer.
    pub total: u16,
    /// This part's zero-based index.
    pub index: u16,
    /// The raw payload slice (not yet base-decoded).
    pub payload: Vec<u8>,
}

/// Parses a single raw part string.
pub fn parse_part(data: &[u8]) -> Result<Part> {
    if data.len() < 8 {
        return Err(Error::BadFormat("BBQr part shorter than the 8-byte header"));
    }
    if &data[0..2] != MAGIC {
        return Err(Error::BadFormat("BBQr part missing \"B$\" magic"));
    }
    let encoding = Encoding::from_byte(data[2])?;
    let file_type = FileType::from_byte(data[3])?;
    let total = base36::decode([data[4], data[5]])?;
    let index = base36::decode([data[6], data[7]])?;
    if total == 0 || total > 1295 {
        return Err(Error::BadFormat("BBQr total out of range"));
    }
    if index >= total {
        return Err(Error::BadFormat("BBQr index out of range"));
    }
    let payload = &data[8..];
    if payload.is_empty() {
        return Err(Error::BadFormat("BBQr part has empty payload"));
    }
    Ok(Part {
        encoding,
        file_type,
        total,
        index,
        payload: payload.to_vec(),
    })
}

/// Reassembles a payload string from `parts`, which must all share
/// `(encoding, file_type, total)` and together cover every index exactly
/// once.
pub fn assemble(parts: &[Part]) -> Result<Vec<u8>> {
    if parts.is_empty() {
        return Err(Error::InvalidArgument("no BBQr parts to assemble"));
    }
    let first = &parts[0];
    let total = first.total as usize;
    let mut slots: Vec<Option<&[u8]>> = vec![None; total];
    for part in parts {
        if part.encoding != first.encoding || part.file_type != first.file_type || part.total != first.total {
            return Err(Error::BadFormat("BBQr parts disagree on encoding/file_type/total"));
        }
        let idx = part.index as usize;
        if slots[idx].is_some() {
            return Err(Error::BadFormat("duplicate BBQr part index"));
        }
        slots[idx] = Some(&part.payload);
    }
    let mut out = Vec::new();
    for (i, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(payload) => out.extend_from_slice(payload),
            None => return Err(Error::BadFormat(format_missing(i))),
        }
    }
    Ok(out)
}

fn format_missing(_index: usize) -> &'static str {
    "missing BBQr part index during reassembly"
}

fn looks_like_zlib(data: &[u8]) -> bool {
    deflate::looks_like_zlib_header(data)
}

/// Decodes a reassembled payload string per its encoding byte.
pub fn decode_payload(encoding: Encoding, payload: &[u8]) -> Result<Vec<u8>> {
    match encoding {
        Encoding::Hex => hex_decode(payload),
        Encoding::Base32 => {
            let text = std::str::from_utf8(payload)
                .map_err(|_| Error::BadFormat("BBQr base32 payload is not valid UTF-8"))?;
            base32::decode(text)
        }
        Encoding::Base32Deflate => {
            let text = std::str::from_utf8(payload)
                .map_err(|_| Error::BadFormat("BBQr base32 payload is not valid UTF-8"))?;
            let compressed = base32::decode(text)?;
            if looks_like_zlib(&compressed) {
                if let Ok(inflated) = deflate::zlib_decompress(&compressed) {
                    return Ok(inflated);
                }
                log::debug!("BBQr 'Z' zlib-header probe matched but inflate failed; falling back to raw deflate");
            }
            deflate::inflate(&compressed).map_err(|_| Error::Decompress("BBQr raw inflate failed"))
        }
    }
}

fn hex_decode(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() % 2 != 0 {
        return Err(Error::BadFormat("odd-length hex payload"));
    }
    let mut out = Vec::with_capacity(data.len() / 2);
    for pair in data.chunks(2) {
        let hi = hex_digit(pair[0])?;
        let lo = hex_digit(pair[1])?;
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

fn hex_digit(b: u8) -> Result<u8> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        _ => Err(Error::BadFormat("invalid hex digit in BBQr payload")),
    }
}

/// Splits `data` into a series of raw BBQr part strings for QR encoding.
pub fn encode(data: &[u8], file_type: FileType, max_chars_per_qr: usize) -> Result<Vec<Vec<u8>>> {
    if data.is_empty() {
        return Err(Error::InvalidArgument("BBQr encode requires non-empty data"));
    }

    let deflated = deflate::deflate(data, 10).ok();
    let (encoding, chosen) = match deflated {
        Some(ref compressed) if compressed.len() < data.len() => (Encoding::Base32Deflate, compressed.as_slice()),
        _ => (Encoding::Base32, data),
    };

    let encoded = base32::encode(chosen);
    let encoded = encoded.as_bytes();

    if max_chars_per_qr < 16 {
        return Err(Error::InvalidArgument("max_chars_per_qr too small for an 8-byte header"));
    }
    let payload_per_part = ((max_chars_per_qr - 8) / 8) * 8;
    if payload_per_part == 0 {
        return Err(Error::InvalidArgument("max_chars_per_qr leaves no room for payload"));
    }

    let num_parts = encoded.len().div_ceil(payload_per_part);
    if num_parts > 1295 {
        return Err(Error::InvalidArgument("payload too large for BBQr (more than 1295 parts)"));
    }
    let num_parts = num_parts.max(1);
    let payload_per_part = encoded.len().div_ceil(num_parts).div_ceil(8) * 8;

    let total = base36::encode(num_parts as u16)?;
    let mut parts = Vec::with_capacity(num_parts);
    for (i, chunk) in encoded.chunks(payload_per_part).enumerate() {
        let index = base36::encode(i as u16)?;
        let mut part = Vec::with_capacity(8 + chunk.len());
        part.extend_from_slice(MAGIC);
        part.push(encoding.to_byte());
        part.push(file_type.to_byte());
        part.extend_from_slice(&total);
        part.extend_from_slice(&index);
        part.extend_from_slice(chunk);
        parts.push(part);
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s3_single_part_psbt_round_trip() {
        let psbt: Vec<u8> = (0..349u32).map(|i| (i % 251) as u8).collect();
        let parts = encode(&psbt, FileType::Psbt, 800).unwrap();
        assert_eq!(parts.len(), 1);
        let part = parse_part(&parts[0]).unwrap();
        assert_eq!(part.total, 1);
        assert_eq!(part.encoding, Encoding::Base32Deflate);
        let assembled = assemble(&[part.clone()]).unwrap();
        let decoded = decode_payload(part.encoding, &assembled).unwrap();
        assert_eq!(decoded, psbt);
    }

    #[test]
    fn multi_part_round_trip() {
        let data: Vec<u8> = (0..4000u32).map(|i| ((i * 7) % 256) as u8).collect();
        let parts_raw = encode(&data, FileType::Transaction, 60).unwrap();
        assert!(parts_raw.len() > 1);
        let mut parts: Vec<Part> = parts_raw.iter().map(|p| parse_part(p).unwrap()).collect();
        // Shuffle to confirm index-order reassembly, not encode order.
        parts.reverse();
        let assembled = assemble(&parts).unwrap();
        let decoded = decode_payload(parts[0].encoding, &assembled).unwrap();
        assert_eq!(decoded, data);
        for raw in &parts_raw {
            assert!(raw.len() <= 60);
        }
    }

    #[test]
    fn parse_rejects_bad_magic() {
        let mut bytes = b"XX2P0100".to_vec();
        bytes.extend_from_slice(b"payload");
        assert!(parse_part(&bytes).is_err());
    }

    #[test]
    fn assemble_fails_on_missing_index() {
        let data = b"hello world, this is a longer message to split";
        let parts_raw = encode(data, FileType::Json, 24).unwrap();
        assert!(parts_raw.len() > 1);
        let parts: Vec<Part> = parts_raw[1..].iter().map(|p| parse_part(p).unwrap()).collect();
        assert!(assemble(&parts).is_err());
    }

    #[test]
    fn hex_decode_round_trip() {
        let encoded = b"48656C6C6F";
        assert_eq!(decode_payload(Encoding::Hex, encoded).unwrap(), b"Hello");
    }

    #[test]
    fn hex_decode_rejects_odd_length() {
        assert!(decode_payload(Encoding::Hex, b"ABC").is_err());
    }
}

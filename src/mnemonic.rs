//! Mnemonic-QR coding: format detection and round-trip conversion between
//! BIP-39 mnemonics and SeedQR / Compact SeedQR / plaintext
//! representations.
//!
//! The BIP-39 wordlist and checksum validation are delegated to the
//! `bip39` crate, used through a narrow conversion interface (entropy <->
//! words); this module owns only the format detection and the
//! SeedQR/Compact digit-group and entropy conversions, grounded in
//! `the SeedQR/Compact SeedQR/plaintext conventions below.

use bip39::{Language, Mnemonic};

use crate::secret::SecretBytes;
use crate::{Error, Result};

/// The detected (or target) representation of a mnemonic buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Raw BIP-39 entropy bytes (16 or 32 in practice).
    Compact,
    /// A decimal-digit string, 4 digits per word.
    SeedQr,
    /// Space-separated lowercase BIP-39 words.
    Plaintext,
    /// None of the above.
    Unknown,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Format::Compact => "compact",
            Format::SeedQr => "seedqr",
            Format::Plaintext => "plaintext",
            Format::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

fn is_printable_ascii(b: u8) -> bool {
    (0x20..=0x7E).contains(&b)
}

/// Detects the representation of a raw byte buffer using a five-step
/// heuristic: buffer length, byte printability, and content shape.
pub fn detect_format(data: &[u8]) -> Format {
    let n = data.len();

    if (n == 16 || n == 32) && data.iter().any(|&b| !is_printable_ascii(b)) {
        return Format::Compact;
    }
    if (n == 48 || n == 96) && data.iter().all(|&b| b.is_ascii_digit()) {
        return Format::SeedQr;
    }
    if data.contains(&b' ')
        && data.iter().any(|&b| b.is_ascii_alphabetic())
        && data.iter().all(|&b| is_printable_ascii(b) || b == b' ')
    {
        return Format::Plaintext;
    }
    if n == 16 || n == 32 {
        return Format::Compact;
    }
    Format::Unknown
}

fn word_index(word: &str) -> Result<u16> {
    Language::English
        .word_list()
        .iter()
        .position(|&w| w == word)
        .map(|i| i as u16)
        .ok_or(Error::BadFormat("unknown BIP-39 word"))
}

fn parse_and_validate(words: &str) -> Result<Mnemonic> {
    Mnemonic::parse_normalized(words).map_err(|_| Error::BadFormat("mnemonic failed BIP-39 checksum"))
}

/// Converts raw entropy bytes to space-separated BIP-39 words.
pub fn compact_to_words(entropy: &[u8]) -> Result<SecretBytes> {
    let mnemonic = Mnemonic::from_entropy(entropy)
        .map_err(|_| Error::InvalidArgument("entropy length is not a valid BIP-39 size"))?;
    Ok(SecretBytes::new(mnemonic.to_string().into_bytes()))
}

/// Converts a SeedQR decimal-digit string to space-separated BIP-39 words.
pub fn seedqr_to_words(digits: &[u8]) -> Result<SecretBytes> {
    if digits.len() % 4 != 0 || digits.is_empty() {
        return Err(Error::BadFormat("SeedQR digit string length is not a multiple of 4"));
    }
    if !digits.iter().all(|b| b.is_ascii_digit()) {
        return Err(Error::BadFormat("SeedQR digit string contains a non-digit byte"));
    }

    let text = std::str::from_utf8(digits).expect("already validated ASCII digits");
    let mut words = Vec::with_capacity(digits.len() / 4);
    for group in text.as_bytes().chunks(4) {
        let group_str = std::str::from_utf8(group).expect("already validated ASCII digits");
        let index: u16 = group_str.parse().expect("4 ASCII digits always parse");
        if index as usize >= Language::English.word_list().len() {
            return Err(Error::BadFormat("SeedQR digit group out of range [0,2047]"));
        }
        words.push(Language::English.word_list()[index as usize]);
    }

    let joined = words.join(" ");
    let mnemonic = parse_and_validate(&joined)?;
    Ok(SecretBytes::new(mnemonic.to_string().into_bytes()))
}

/// Validates a plaintext space-separated mnemonic, returning it normalized.
pub fn plaintext_to_words(text: &[u8]) -> Result<SecretBytes> {
    let text = std::str::from_utf8(text).map_err(|_| Error::BadFormat("mnemonic is not valid UTF-8"))?;
    let mnemonic = parse_and_validate(text)?;
    Ok(SecretBytes::new(mnemonic.to_string().into_bytes()))
}

/// Converts space-separated BIP-39 words to a SeedQR decimal-digit string.
pub fn words_to_seedqr(words: &str) -> Result<SecretBytes> {
    parse_and_validate(words)?;
    let mut digits = String::with_capacity(words.split_whitespace().count() * 4);
    for word in words.split_whitespace() {
        let index = word_index(word)?;
        digits.push_str(&format!("{:04}", index));
    }
    Ok(SecretBytes::new(digits.into_bytes()))
}

/// Converts space-separated BIP-39 words back to raw entropy bytes.
pub fn words_to_compact(words: &str) -> Result<SecretBytes> {
    let mnemonic = parse_and_validate(words)?;
    Ok(SecretBytes::new(mnemonic.to_entropy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON_ABOUT: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn detect_format_compact_by_length_and_nonprintable() {
        let mut entropy = vec![0x00u8; 16];
        entropy[0] = 0xFF;
        assert_eq!(detect_format(&entropy), Format::Compact);
    }

    #[test]
    fn detect_format_compact_falls_back_for_all_printable() {
        let entropy = vec![b'a'; 16];
        assert_eq!(detect_format(&entropy), Format::Compact);
    }

    #[test]
    fn detect_format_seedqr_by_digit_string() {
        let digits = "0".repeat(48).into_bytes();
        assert_eq!(detect_format(&digits), Format::SeedQr);
    }

    #[test]
    fn detect_format_plaintext_by_space_and_letters() {
        assert_eq!(detect_format(ABANDON_ABOUT.as_bytes()), Format::Plaintext);
    }

    #[test]
    fn s5_seedqr_exact_digits_for_abandon_about() {
        let digits = words_to_seedqr(ABANDON_ABOUT).unwrap();
        let expected = "0000".repeat(11) + "0003";
        assert_eq!(digits.as_slice(), expected.as_bytes());
    }

    #[test]
    fn compact_round_trips_through_words() {
        let entropy = vec![0u8; 16];
        let words = compact_to_words(&entropy).unwrap();
        let words_str = std::str::from_utf8(words.as_slice()).unwrap();
        let back = words_to_compact(words_str).unwrap();
        assert_eq!(back.as_slice(), entropy.as_slice());
    }

    #[test]
    fn seedqr_round_trips_to_plaintext() {
        let seedqr = words_to_seedqr(ABANDON_ABOUT).unwrap();
        let words = seedqr_to_words(seedqr.as_slice()).unwrap();
        assert_eq!(words.as_slice(), ABANDON_ABOUT.as_bytes());
    }

    #[test]
    fn invalid_checksum_is_rejected() {
        let bad = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon";
        assert!(plaintext_to_words(bad.as_bytes()).is_err());
    }

    #[test]
    fn unknown_word_is_rejected() {
        let bad = ABANDON_ABOUT.replace("about", "zzzznotaword");
        assert!(plaintext_to_words(bad.as_bytes()).is_err());
    }
}

//! End-to-end scenarios S1-S6.

use kefqr::bbqr::{self, FileType};
use kefqr::codec::base32;
use kefqr::codec::deflate;
use kefqr::crypto::{Password, kef};
use kefqr::mnemonic;
use kefqr::Error;

#[test]
fn s1_kef_v21_round_trip_and_bit_flip_fails() {
    let plaintext = b"abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    let password = Password::new("correct horse battery staple");
    let mut envelope = kef::encrypt(plaintext, b"73C5DA0A", 21, &password, 100_000).unwrap();

    let decrypted = kef::decrypt(&envelope, &password).unwrap();
    assert_eq!(decrypted.as_slice(), plaintext.as_slice());

    let last = envelope.len() - 1;
    envelope[last] ^= 0x01;
    assert!(matches!(kef::decrypt(&envelope, &password), Err(Error::Auth)));
}

#[test]
fn s2_kef_v6_duplicate_block_refusal() {
    let plaintext = vec![0xAAu8; 32];
    let password = Password::new("x");
    let result = kef::encrypt(&plaintext, b"x", 6, &password, 10_000);
    assert!(matches!(result, Err(Error::DuplicateBlocks)));
}

#[test]
fn s3_bbqr_single_part_psbt_round_trip() {
    let psbt: Vec<u8> = (0..349u32).map(|i| ((i * 31) % 256) as u8).collect();
    let parts = bbqr::encode(&psbt, FileType::Psbt, 800).unwrap();
    assert_eq!(parts.len(), 1);

    let part = bbqr::parse_part(&parts[0]).unwrap();
    assert_eq!(part.total, 1);
    assert_eq!(part.encoding, bbqr::Encoding::Base32Deflate);

    let assembled = bbqr::assemble(&[part.clone()]).unwrap();
    let decoded = bbqr::decode_payload(part.encoding, &assembled).unwrap();
    assert_eq!(decoded, psbt);
}

#[test]
fn s4_base32_rfc_vector() {
    assert_eq!(base32::encode(b"Hello World"), "JBSWY3DPEBLW64TMMQ======");
}

#[test]
fn s5_seedqr_exact_digits_for_abandon_about() {
    let mnemonic_str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    let digits = mnemonic::words_to_seedqr(mnemonic_str).unwrap();
    let expected = "0000".repeat(11) + "0003";
    assert_eq!(digits.as_slice(), expected.as_bytes());
}

#[test]
fn s6_deflate_round_trip_on_pseudo_random_pattern() {
    let data: Vec<u8> = (0..4096u32).map(|i| ((17 * i + i / 128) & 0xFF) as u8).collect();
    let compressed = deflate::deflate(&data, 10).unwrap();
    let decompressed = deflate::inflate(&compressed).unwrap();
    assert_eq!(decompressed, data);
}

//! Leaf-level codecs shared by the KEF envelope, BBQr transport, and
//! mnemonic-QR coder: raw DEFLATE, and the Base32/Base43/Base36 integer
//! codecs.

pub mod base32;
pub mod base36;
pub mod base43;
pub mod deflate;

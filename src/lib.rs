//! # kefqr
//!
//! The data-plane of a hardware Bitcoin seed-management device: KEF
//! encryption envelopes, BBQr chunked-QR transport, a raw-DEFLATE codec,
//! and BIP-39 mnemonic-QR coding.
//!
//! This crate is a pure function library with no global mutable state
//! beyond the read-only BIP-39 wordlist. Every fallible operation returns
//! [`Result<T>`]; every buffer that can hold key material, a mnemonic, or
//! derived keys is a [`secret::SecretBytes`] that zeroizes on drop.
//!
//! ## Quick start
//!
//! ### Encrypting a mnemonic into a KEF envelope
//!
//! ```rust
//! use kefqr::crypto::{Password, kef};
//!
//! let password = Password::new("correct horse battery staple");
//! let plaintext = b"abandon abandon abandon abandon abandon abandon \
//!                    abandon abandon abandon abandon abandon about";
//! let envelope = kef::encrypt(plaintext, b"73C5DA0A", 21, &password, 100_000)?;
//! let decrypted = kef::decrypt(&envelope, &password)?;
//! assert_eq!(decrypted.as_slice(), plaintext);
//! # Ok::<(), kefqr::Error>(())
//! ```
//!
//! ### Splitting a payload across BBQr parts
//!
//! ```rust
//! use kefqr::bbqr::{self, FileType};
//!
//! let psbt = vec![0u8; 349];
//! let parts = bbqr::encode(&psbt, FileType::Psbt, 800)?;
//! assert_eq!(parts.len(), 1);
//! # Ok::<(), kefqr::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod bbqr;
pub mod codec;
pub mod crypto;
mod error;
pub mod mnemonic;
pub mod secret;
pub mod storage;

pub use crypto::Password;
pub use error::{Error, Result};
pub use secret::SecretBytes;

//! # eth-kms-signer
//!
//! Ethereum signing backed by AWS KMS. Private key material never leaves
//! the KMS service; this crate turns the DER-encoded ECDSA signatures KMS
//! produces into the `(r, s, v)` form Ethereum signature verification and
//! address recovery require.
//!
//! ## Architecture
//!
//! ```text
//! AwsKmsSigner (EVM signing entry points, cached address)
//!   ├── AwsKmsService (key binding over the AwsKmsK256 transport trait)
//!   │     └── AwsKmsClient (aws-sdk-kms)
//!   └── utils (DER decoding, low-s normalization, recovery-id resolution,
//!              address derivation)
//! ```
//!
//! The remote service is abstracted behind [`services::AwsKmsK256`] so the
//! signing pipeline can be exercised against in-memory implementations.

pub mod domain;
pub mod models;
pub mod services;
pub mod utils;

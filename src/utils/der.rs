//! DER parsing for ECDSA signatures and KMS public key blobs.
//!
//! AWS KMS returns ECDSA signatures as a BER/DER `ECDSA-Sig-Value`
//! (`SEQUENCE { INTEGER r, INTEGER s }`) and public keys in SPKI form.
//! This module unwraps both into the raw material the rest of the crate
//! works with.

use k256::pkcs8::DecodePublicKey;
use serde::Serialize;

const TAG_SEQUENCE: u8 = 0x30;
const TAG_INTEGER: u8 = 0x02;

#[derive(Debug, Clone, thiserror::Error, Serialize)]
pub enum DerError {
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// Reads a definite length at `pos`: short form, or long form with a single
/// length octet (the largest a secp256k1 signature can need).
fn read_length(der: &[u8], pos: usize) -> Result<(usize, usize), DerError> {
    let first = *der
        .get(pos)
        .ok_or_else(|| DerError::MalformedSignature("truncated length".to_string()))?;
    match first {
        0x00..=0x7f => Ok((first as usize, pos + 1)),
        0x81 => {
            let length = *der.get(pos + 1).ok_or_else(|| {
                DerError::MalformedSignature("truncated long-form length".to_string())
            })? as usize;
            if length < 0x80 {
                return Err(DerError::MalformedSignature(
                    "non-minimal long-form length".to_string(),
                ));
            }
            Ok((length, pos + 2))
        }
        _ => Err(DerError::MalformedSignature(format!(
            "unsupported length encoding 0x{first:02x}"
        ))),
    }
}

/// Reads one INTEGER at `pos`, returning its content with the sign-padding
/// byte stripped, and the position just past it.
fn read_integer(der: &[u8], pos: usize) -> Result<(Vec<u8>, usize), DerError> {
    let tag = *der
        .get(pos)
        .ok_or_else(|| DerError::MalformedSignature("truncated INTEGER".to_string()))?;
    if tag != TAG_INTEGER {
        return Err(DerError::MalformedSignature(format!(
            "expected INTEGER tag, got 0x{tag:02x}"
        )));
    }

    let (length, content_start) = read_length(der, pos + 1)?;
    if length == 0 {
        return Err(DerError::MalformedSignature("empty INTEGER".to_string()));
    }
    let end = content_start
        .checked_add(length)
        .filter(|&end| end <= der.len())
        .ok_or_else(|| {
            DerError::MalformedSignature("INTEGER length overruns buffer".to_string())
        })?;

    let mut content = &der[content_start..end];
    // r and s are unsigned; a set high bit would make the INTEGER negative.
    if content[0] & 0x80 != 0 {
        return Err(DerError::MalformedSignature(
            "negative INTEGER".to_string(),
        ));
    }
    // Strip the zero byte DER prepends to keep high-bit values non-negative.
    while content.len() > 1 && content[0] == 0x00 {
        content = &content[1..];
    }

    Ok((content.to_vec(), end))
}

/// Decodes a DER `ECDSA-Sig-Value` into raw unsigned big-endian `r` and `s`
/// buffers with any ASN.1 sign padding stripped.
pub fn decode_ecdsa_signature(der: &[u8]) -> Result<(Vec<u8>, Vec<u8>), DerError> {
    let tag = *der
        .first()
        .ok_or_else(|| DerError::MalformedSignature("empty input".to_string()))?;
    if tag != TAG_SEQUENCE {
        return Err(DerError::MalformedSignature(format!(
            "expected SEQUENCE tag, got 0x{tag:02x}"
        )));
    }

    let (sequence_length, content_start) = read_length(der, 1)?;
    if content_start + sequence_length != der.len() {
        return Err(DerError::MalformedSignature(
            "SEQUENCE length does not match input length".to_string(),
        ));
    }

    let (r, pos) = read_integer(der, content_start)?;
    let (s, pos) = read_integer(der, pos)?;
    if pos != der.len() {
        return Err(DerError::MalformedSignature(
            "trailing bytes after signature".to_string(),
        ));
    }

    Ok((r, s))
}

/// Extracts a secp256k1 public key from a KMS public key blob.
///
/// KMS returns SPKI/DER; raw SEC1 points (33-byte compressed or 65-byte
/// uncompressed) are also accepted for callers that already unwrapped the
/// key.
pub fn extract_public_key_from_der(der: &[u8]) -> Result<k256::PublicKey, DerError> {
    if matches!(der.first(), Some(&(0x02 | 0x03 | 0x04))) && (der.len() == 33 || der.len() == 65) {
        return k256::PublicKey::from_sec1_bytes(der)
            .map_err(|e| DerError::InvalidPublicKey(format!("SEC1 parse error: {e}")));
    }

    k256::PublicKey::from_public_key_der(der)
        .map_err(|e| DerError::InvalidPublicKey(format!("ASN.1 parse error: {e}")))
}

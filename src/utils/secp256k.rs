//! secp256k1 signature canonicalization and recovery-id resolution.
//!
//! Scalars are handled as fixed-width 256-bit integers; every valid `r` and
//! `s` is bounded by the curve order.

use k256::{
    ecdsa::{RecoveryId, Signature, VerifyingKey},
    elliptic_curve::bigint::{Encoding, U256},
};
use serde::Serialize;

use super::{
    address_derivation::derive_ethereum_address,
    der::{decode_ecdsa_signature, DerError},
};

/// Order of the secp256k1 group, big-endian.
const CURVE_ORDER: U256 =
    U256::from_be_hex("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141");

/// Half the group order; a canonical `s` is never above this.
const CURVE_ORDER_HALF: U256 =
    U256::from_be_hex("7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0");

#[derive(Debug, Clone, thiserror::Error, Serialize)]
pub enum Secp256k1Error {
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Recovery failed: {0}")]
    RecoveryFailed(String),
}

impl From<DerError> for Secp256k1Error {
    fn from(e: DerError) -> Self {
        match e {
            DerError::MalformedSignature(msg) => Secp256k1Error::MalformedSignature(msg),
            DerError::InvalidPublicKey(msg) => Secp256k1Error::InvalidPublicKey(msg),
        }
    }
}

/// Left-pads a stripped DER integer into a fixed 32-byte scalar.
fn to_scalar_bytes(raw: &[u8], name: &str) -> Result<[u8; 32], Secp256k1Error> {
    if raw.len() > 32 {
        return Err(Secp256k1Error::MalformedSignature(format!(
            "{name} is {} bytes, expected at most 32",
            raw.len()
        )));
    }
    let mut out = [0u8; 32];
    out[32 - raw.len()..].copy_from_slice(raw);
    Ok(out)
}

fn check_scalar_range(bytes: &[u8; 32], name: &str) -> Result<(), Secp256k1Error> {
    let value = U256::from_be_slice(bytes);
    if value == U256::ZERO || value >= CURVE_ORDER {
        return Err(Secp256k1Error::MalformedSignature(format!(
            "{name} is out of range for the curve order"
        )));
    }
    Ok(())
}

/// Rewrites `s` into low-s form (EIP-2): values above half the group order
/// map to `n - s`, everything else passes through unchanged.
pub fn normalize_s(s: [u8; 32]) -> [u8; 32] {
    let value = U256::from_be_slice(&s);
    if value > CURVE_ORDER_HALF {
        CURVE_ORDER.wrapping_sub(&value).to_be_bytes()
    } else {
        s
    }
}

/// Parses a DER signature from the remote signer into a canonical low-s
/// signature, checking `0 < r, s < n` on the way.
pub fn signature_from_der(der: &[u8]) -> Result<Signature, Secp256k1Error> {
    let (raw_r, raw_s) = decode_ecdsa_signature(der)?;
    let r = to_scalar_bytes(&raw_r, "r")?;
    let s = to_scalar_bytes(&raw_s, "s")?;
    check_scalar_range(&r, "r")?;
    check_scalar_range(&s, "s")?;

    Signature::from_scalars(r, normalize_s(s))
        .map_err(|e| Secp256k1Error::MalformedSignature(format!("invalid scalar pair: {e}")))
}

/// Resolves which of the two recovery candidates reproduces the signer.
///
/// An ECDSA signature does not record which of the two candidate public
/// keys produced it, so both are recovered and checked against the known
/// signer address.
pub fn resolve_recovery_id(
    digest: &[u8; 32],
    signature: &Signature,
    expected_address: &[u8; 20],
) -> Result<u8, Secp256k1Error> {
    for candidate in 0u8..2 {
        let recovery_id = match RecoveryId::from_byte(candidate) {
            Some(id) => id,
            None => continue,
        };

        if let Ok(recovered) = VerifyingKey::recover_from_prehash(digest, signature, recovery_id)
        {
            let point = recovered.to_encoded_point(false);
            if let Ok(address) = derive_ethereum_address(point.as_bytes()) {
                if address == *expected_address {
                    return Ok(candidate);
                }
            }
        }
    }

    Err(Secp256k1Error::RecoveryFailed(
        "no recovery id reproduces the signer address; \
         digest, signature, or address mismatch"
            .to_string(),
    ))
}

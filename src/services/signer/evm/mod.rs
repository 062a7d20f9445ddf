//! # EVM Signing
//!
//! EVM signing entry points backed by AWS KMS, plus the shared hashing and
//! formatting helpers they use.
//!
//! ## Features
//!
//! - **Transaction Signing**: legacy and EIP-1559 transactions
//! - **Data Signing**: EIP-191 personal messages
//! - **Typed Data**: EIP-712 structured data
//!
//! All signatures are malleability-protected (EIP-2 low-s normalization)
//! and carry a recovery id resolved against the signer's own address.

mod aws_kms_signer;
pub use aws_kms_signer::*;

pub(crate) mod utils;

use alloy::primitives::keccak256;

use crate::domain::{SignDataResponseEvm, SignTypedDataRequest};
use crate::services::signer::SignerError;

// EIP-712 and ECDSA constants
const EIP712_PREFIX: [u8; 2] = [0x19, 0x01];
const EIP712_MESSAGE_SIZE: usize = 66; // 2 (prefix) + 32 (domain) + 32 (struct)

/// SECP256K1 signature length: 32 bytes (r) + 32 bytes (s) + 1 byte (v)
const SECP256K1_SIGNATURE_LENGTH: usize = 65;

/// Keccak256 hash output length
const HASH_LENGTH: usize = 32;

/// Recovery-id offset for pre-EIP-155 signatures.
pub(crate) const LEGACY_SIGNATURE_V_BASE: u8 = 27;

/// Validates and decodes a hex string, reporting the position of the first
/// invalid character.
fn validate_and_decode_hex(value: &str, field_name: &str) -> Result<Vec<u8>, SignerError> {
    let hex_str = value.strip_prefix("0x").unwrap_or(value);

    if let Some((pos, ch)) = hex_str
        .chars()
        .enumerate()
        .find(|(_, c)| !c.is_ascii_hexdigit())
    {
        return Err(SignerError::SigningError(format!(
            "Invalid {} hex: non-hexadecimal character '{}' at position {} (input: {}...)",
            field_name,
            ch,
            pos,
            &hex_str[..hex_str.len().min(16)]
        )));
    }

    hex::decode(hex_str).map_err(|e| {
        SignerError::SigningError(format!(
            "Invalid {} hex: failed to decode - {} (input: {}...)",
            field_name,
            e,
            &hex_str[..hex_str.len().min(16)]
        ))
    })
}

/// Constructs the EIP-712 message hash from a domain separator and a struct
/// hash:
///
/// ```text
/// keccak256("\x19\x01" ‖ domainSeparator ‖ hashStruct(message))
/// ```
///
/// Both components must be exactly 32 bytes, supplied as hex with or
/// without a `0x` prefix. The domain separator is what scopes the
/// signature to one contract and chain; callers are responsible for its
/// contents per <https://eips.ethereum.org/EIPS/eip-712>.
pub fn construct_eip712_message_hash(
    request: &SignTypedDataRequest,
) -> Result<[u8; 32], SignerError> {
    let domain_separator = validate_and_decode_hex(&request.domain_separator, "domain separator")?;
    let hash_struct = validate_and_decode_hex(&request.hash_struct_message, "hash struct message")?;

    if domain_separator.len() != HASH_LENGTH {
        return Err(SignerError::SigningError(format!(
            "Invalid domain separator length: expected {} bytes, got {}",
            HASH_LENGTH,
            domain_separator.len()
        )));
    }
    if hash_struct.len() != HASH_LENGTH {
        return Err(SignerError::SigningError(format!(
            "Invalid hash struct length: expected {} bytes, got {}",
            HASH_LENGTH,
            hash_struct.len()
        )));
    }

    let mut eip712_message = [0u8; EIP712_MESSAGE_SIZE];
    eip712_message[0..2].copy_from_slice(&EIP712_PREFIX);
    eip712_message[2..34].copy_from_slice(&domain_separator);
    eip712_message[34..66].copy_from_slice(&hash_struct);

    let message_hash = keccak256(eip712_message);

    Ok(message_hash.into())
}

/// Validates signature length and splits it into a [`SignDataResponseEvm`].
pub(crate) fn validate_and_format_signature(
    signature_bytes: &[u8],
    signer_name: &str,
) -> Result<SignDataResponseEvm, SignerError> {
    if signature_bytes.len() != SECP256K1_SIGNATURE_LENGTH {
        return Err(SignerError::SigningError(format!(
            "Invalid signature length from {}: expected {} bytes, got {}",
            signer_name,
            SECP256K1_SIGNATURE_LENGTH,
            signature_bytes.len()
        )));
    }

    Ok(SignDataResponseEvm {
        r: hex::encode(&signature_bytes[0..32]),
        s: hex::encode(&signature_bytes[32..64]),
        v: signature_bytes[64],
        sig: hex::encode(signature_bytes),
    })
}

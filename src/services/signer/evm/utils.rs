//! Shared EVM signature recovery for KMS-backed signing.

use crate::{
    models::EvmAddress,
    utils::{resolve_recovery_id, signature_from_der, Secp256k1Error},
};

/// Converts a DER signature from the remote signer into the 65-byte
/// `r || s || v` form.
///
/// Handles DER decoding, EIP-2 low-s normalization, and recovery-id
/// resolution by trial recovery against the signer's known address.
/// `v_base` is the caller's recovery-id offset; 27 for pre-EIP-155
/// signatures.
pub(crate) fn recover_evm_signature_from_der(
    der_signature: &[u8],
    digest: [u8; 32],
    signer_address: &EvmAddress,
    v_base: u8,
) -> Result<[u8; 65], Secp256k1Error> {
    let signature = signature_from_der(der_signature)?;
    let recovery_id = resolve_recovery_id(&digest, &signature, signer_address.as_bytes())?;

    let mut sig_bytes = [0u8; 65];
    sig_bytes[..64].copy_from_slice(&signature.to_bytes());
    sig_bytes[64] = v_base + recovery_id;
    Ok(sig_bytes)
}

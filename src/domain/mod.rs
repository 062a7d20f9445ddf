//! Request and response models for the signing entry points.

use serde::{Deserialize, Serialize};

use crate::models::EvmTransactionDataSignature;

/// Request to sign an EIP-191 personal message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignDataRequest {
    pub message: String,
}

/// Request to sign EIP-712 typed data, given its two 32-byte components as
/// hex strings (with or without a `0x` prefix).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignTypedDataRequest {
    pub domain_separator: String,
    pub hash_struct_message: String,
}

/// A message or typed-data signature, split into parts and as the full
/// hex-encoded 65-byte compact form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignDataResponseEvm {
    pub r: String,
    pub s: String,
    pub v: u8,
    pub sig: String,
}

/// A signed transaction: its hash, the signature parts, and the raw
/// RLP/EIP-2718 encoded bytes ready for broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignTransactionResponseEvm {
    pub hash: String,
    pub signature: EvmTransactionDataSignature,
    pub raw: Vec<u8>,
}

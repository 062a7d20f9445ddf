//! # Signer Services
//!
//! Signing interfaces and their EVM implementation. A [`Signer`] resolves
//! its address and signs transactions; [`DataSignerTrait`] covers EIP-191
//! messages and EIP-712 typed data.

pub mod evm;
pub use evm::*;

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    domain::{
        SignDataRequest, SignDataResponseEvm, SignTransactionResponseEvm, SignTypedDataRequest,
    },
    models::{EvmAddress, EvmTransactionData, TransactionError},
    services::aws_kms::AwsKmsError,
    utils::Secp256k1Error,
};

#[derive(Debug, Clone, thiserror::Error, Serialize)]
pub enum SignerError {
    #[error("Failed to sign: {0}")]
    SigningError(String),
    #[error("Conversion error: {0}")]
    ConversionError(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("AWS KMS error: {0}")]
    KmsError(#[from] AwsKmsError),
    #[error("Signature recovery error: {0}")]
    RecoveryError(#[from] Secp256k1Error),
    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),
}

#[async_trait]
pub trait Signer: Send + Sync {
    /// Returns the signer's EVM address.
    async fn address(&self) -> Result<EvmAddress, SignerError>;

    /// Signs an EVM transaction (legacy or EIP-1559).
    async fn sign_transaction(
        &self,
        transaction: EvmTransactionData,
    ) -> Result<SignTransactionResponseEvm, SignerError>;
}

#[async_trait]
pub trait DataSignerTrait: Send + Sync {
    /// Signs an EIP-191 personal message.
    async fn sign_data(&self, request: SignDataRequest)
        -> Result<SignDataResponseEvm, SignerError>;

    /// Signs EIP-712 typed data given its domain separator and struct hash.
    async fn sign_typed_data(
        &self,
        request: SignTypedDataRequest,
    ) -> Result<SignDataResponseEvm, SignerError>;
}

//! # AWS KMS Signer for EVM
//!
//! EVM signer whose key lives in AWS KMS. Each signing call makes exactly
//! one remote sign request; the signer address is derived from the KMS
//! public key once, on first use, and cached for the signer's lifetime.
//!
//! Private keys never leave KMS. The DER signatures it returns are
//! normalized to low-s and completed with a recovery id resolved against
//! the cached address.

use alloy::{
    consensus::{SignableTransaction, TxEip1559, TxLegacy},
    primitives::{eip191_hash_message, PrimitiveSignature},
};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::{
    domain::{
        SignDataRequest, SignDataResponseEvm, SignTransactionResponseEvm, SignTypedDataRequest,
    },
    models::{AwsKmsSignerConfig, EvmAddress, EvmTransactionData, EvmTransactionDataSignature},
    services::{
        aws_kms::{AwsKmsClient, AwsKmsK256, AwsKmsService},
        signer::{DataSignerTrait, Signer, SignerError},
    },
};

use super::{
    construct_eip712_message_hash, utils::recover_evm_signature_from_der,
    validate_and_format_signature, LEGACY_SIGNATURE_V_BASE,
};

pub struct AwsKmsSigner<T: AwsKmsK256 = AwsKmsClient> {
    kms_service: AwsKmsService<T>,
    // Written at most once; OnceCell keeps concurrent first callers behind
    // a single KMS GetPublicKey round trip.
    address: OnceCell<EvmAddress>,
}

impl AwsKmsSigner<AwsKmsClient> {
    pub async fn new(config: AwsKmsSignerConfig) -> Result<Self, SignerError> {
        let kms_service = AwsKmsService::new(config).await.map_err(|e| {
            SignerError::Configuration(format!("AWS KMS service error: {}", e))
        })?;
        Ok(Self::with_service(kms_service))
    }
}

impl<T: AwsKmsK256> AwsKmsSigner<T> {
    /// Wraps an already-constructed KMS service.
    pub fn with_service(kms_service: AwsKmsService<T>) -> Self {
        Self {
            kms_service,
            address: OnceCell::new(),
        }
    }

    /// Rebinds this signer's key to a different KMS transport.
    ///
    /// The new signer shares the key configuration but starts with an
    /// unresolved address; it is re-derived lazily on first use.
    pub fn connect<U: AwsKmsK256>(&self, client: U) -> AwsKmsSigner<U> {
        AwsKmsSigner::with_service(AwsKmsService::new_with_client(
            client,
            self.kms_service.config.clone(),
        ))
    }

    /// Returns the signer address, fetching the public key on first use.
    pub async fn resolve_address(&self) -> Result<EvmAddress, SignerError> {
        let address = self
            .address
            .get_or_try_init(|| async {
                debug!("resolving signer address from AWS KMS public key");
                self.kms_service.get_evm_address().await
            })
            .await?;
        Ok(*address)
    }

    /// Signs a pre-computed 32-byte digest.
    ///
    /// Returns the 65-byte `r || s || v` signature with `v` in 27/28 form.
    pub async fn sign_hash(&self, hash: &[u8; 32]) -> Result<[u8; 65], SignerError> {
        let address = self.resolve_address().await?;
        let der_signature = self.kms_service.sign_digest_evm(*hash).await?;
        let signature = recover_evm_signature_from_der(
            &der_signature,
            *hash,
            &address,
            LEGACY_SIGNATURE_V_BASE,
        )?;
        Ok(signature)
    }
}

#[async_trait]
impl<T: AwsKmsK256> Signer for AwsKmsSigner<T> {
    async fn address(&self) -> Result<EvmAddress, SignerError> {
        self.resolve_address().await
    }

    async fn sign_transaction(
        &self,
        transaction: EvmTransactionData,
    ) -> Result<SignTransactionResponseEvm, SignerError> {
        if transaction.is_eip1559() {
            let unsigned_tx = TxEip1559::try_from(&transaction)?;

            let digest: [u8; 32] = unsigned_tx.signature_hash().into();
            let sig_bytes = self.sign_hash(&digest).await?;

            let signature = PrimitiveSignature::from_raw(&sig_bytes)
                .map_err(|e| SignerError::ConversionError(e.to_string()))?;

            let mut signature_bytes = signature.as_bytes();
            let signed_tx = unsigned_tx.into_signed(signature);

            // Typed transactions carry the raw parity, not 27/28.
            if signature_bytes[64] == 27 {
                signature_bytes[64] = 0;
            } else if signature_bytes[64] == 28 {
                signature_bytes[64] = 1;
            }

            let mut raw = Vec::with_capacity(signed_tx.eip2718_encoded_length());
            signed_tx.eip2718_encode(&mut raw);

            Ok(SignTransactionResponseEvm {
                hash: signed_tx.hash().to_string(),
                signature: EvmTransactionDataSignature::from(&signature_bytes),
                raw,
            })
        } else {
            let unsigned_tx = TxLegacy::try_from(&transaction)?;

            let digest: [u8; 32] = unsigned_tx.signature_hash().into();
            let sig_bytes = self.sign_hash(&digest).await?;

            let signature = PrimitiveSignature::from_raw(&sig_bytes)
                .map_err(|e| SignerError::ConversionError(e.to_string()))?;

            let signature_bytes = signature.as_bytes();
            let signed_tx = unsigned_tx.into_signed(signature);

            let mut raw = Vec::with_capacity(signed_tx.rlp_encoded_length());
            signed_tx.rlp_encode(&mut raw);

            Ok(SignTransactionResponseEvm {
                hash: signed_tx.hash().to_string(),
                signature: EvmTransactionDataSignature::from(&signature_bytes),
                raw,
            })
        }
    }
}

#[async_trait]
impl<T: AwsKmsK256> DataSignerTrait for AwsKmsSigner<T> {
    async fn sign_data(
        &self,
        request: SignDataRequest,
    ) -> Result<SignDataResponseEvm, SignerError> {
        let digest: [u8; 32] = eip191_hash_message(request.message.as_bytes()).into();
        let signature_bytes = self.sign_hash(&digest).await?;
        validate_and_format_signature(&signature_bytes, "AWS KMS")
    }

    async fn sign_typed_data(
        &self,
        request: SignTypedDataRequest,
    ) -> Result<SignDataResponseEvm, SignerError> {
        let digest = construct_eip712_message_hash(&request)?;
        let signature_bytes = self.sign_hash(&digest).await?;
        validate_and_format_signature(&signature_bytes, "AWS KMS")
    }
}

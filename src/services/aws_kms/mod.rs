//! # AWS KMS Service Module
//!
//! Integration with AWS KMS for secp256k1 key operations: public key
//! retrieval and digest signing for EVM signatures.
//!
//! ## Architecture
//!
//! ```text
//! AwsKmsService<T: AwsKmsK256>
//!   ├── Public Key Retrieval (DER/SPKI, via AwsKmsK256)
//!   └── Digest Signing (ECDSA_SHA_256, DER signature, via AwsKmsK256)
//! ```
//!
//! `AwsKmsK256` is implemented by `AwsKmsClient` against the real service,
//! mocked with `mockall` in unit tests, and fakeable in integration tests.

use async_trait::async_trait;
use aws_config::{meta::region::RegionProviderChain, BehaviorVersion, Region};
use aws_sdk_kms::{
    config::Credentials,
    primitives::Blob,
    types::{MessageType, SigningAlgorithmSpec},
    Client,
};
use serde::Serialize;
use tracing::debug;

use crate::{
    models::{AwsKmsSignerConfig, EvmAddress},
    utils::derive_ethereum_address_from_der,
};

#[cfg(test)]
use mockall::automock;

#[derive(Debug, Clone, thiserror::Error, Serialize)]
pub enum AwsKmsError {
    #[error("AWS KMS config error: {0}")]
    ConfigError(String),
    #[error("AWS KMS key fetch error: {0}")]
    KeyFetchFailed(String),
    #[error("AWS KMS signing error: {0}")]
    RemoteSignFailed(String),
    #[error("AWS KMS response parse error: {0}")]
    ParseError(String),
}

pub type AwsKmsResult<T> = Result<T, AwsKmsError>;

/// Remote secp256k1 operations exposed by AWS KMS.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait AwsKmsK256: Send + Sync {
    /// Fetches the DER-encoded public key for `key_id`.
    async fn get_der_public_key<'a, 'b>(&'a self, key_id: &'b str) -> AwsKmsResult<Vec<u8>>;
    /// Signs a digest using the EcdsaSha256 spec. Returns a DER-encoded
    /// signature.
    async fn sign_digest<'a, 'b>(
        &'a self,
        key_id: &'b str,
        digest: [u8; 32],
    ) -> AwsKmsResult<Vec<u8>>;
}

#[derive(Debug, Clone)]
pub struct AwsKmsClient {
    inner: Client,
}

impl AwsKmsClient {
    pub async fn new(config: &AwsKmsSignerConfig) -> AwsKmsResult<Self> {
        let region_provider =
            RegionProviderChain::first_try(config.region.clone().map(Region::new))
                .or_default_provider();

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);
        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key.as_str(),
                config
                    .session_token
                    .as_ref()
                    .map(|token| token.as_str().to_string()),
                None,
                "eth-kms-signer-static",
            ));
        }
        let auth_config = loader.load().await;

        Ok(Self {
            inner: Client::new(&auth_config),
        })
    }
}

#[async_trait]
impl AwsKmsK256 for AwsKmsClient {
    async fn get_der_public_key<'a, 'b>(&'a self, key_id: &'b str) -> AwsKmsResult<Vec<u8>> {
        debug!("fetching secp256k1 public key from AWS KMS, key_id: {key_id}");

        let get_output = self
            .inner
            .get_public_key()
            .key_id(key_id)
            .send()
            .await
            .map_err(|e| {
                AwsKmsError::KeyFetchFailed(format!(
                    "Failed to get secp256k1 public key for key '{key_id}': {e:?}"
                ))
            })?;

        let der_pk_blob = get_output
            .public_key
            .ok_or(AwsKmsError::KeyFetchFailed(
                "No public key blob found".to_string(),
            ))?
            .into_inner();

        Ok(der_pk_blob)
    }

    async fn sign_digest<'a, 'b>(
        &'a self,
        key_id: &'b str,
        digest: [u8; 32],
    ) -> AwsKmsResult<Vec<u8>> {
        debug!("signing digest with AWS KMS, key_id: {key_id}");

        let sign_result = self
            .inner
            .sign()
            .key_id(key_id)
            .signing_algorithm(SigningAlgorithmSpec::EcdsaSha256)
            .message_type(MessageType::Digest)
            .message(Blob::new(digest))
            .send()
            .await;

        let der_signature = sign_result
            .map_err(|e| AwsKmsError::RemoteSignFailed(e.to_string()))?
            .signature
            .ok_or(AwsKmsError::RemoteSignFailed(
                "Signature not found in response".to_string(),
            ))?
            .into_inner();

        Ok(der_signature)
    }
}

/// Binds a KMS transport to a configured key and exposes the EVM-flavored
/// operations on it.
pub struct AwsKmsService<T: AwsKmsK256 = AwsKmsClient> {
    pub config: AwsKmsSignerConfig,
    client: T,
}

impl AwsKmsService<AwsKmsClient> {
    pub async fn new(config: AwsKmsSignerConfig) -> AwsKmsResult<Self> {
        if config.key_id.is_empty() {
            return Err(AwsKmsError::ConfigError(
                "Key ID cannot be empty".to_string(),
            ));
        }
        let client = AwsKmsClient::new(&config).await?;
        Ok(Self { config, client })
    }
}

impl<T: AwsKmsK256> AwsKmsService<T> {
    /// Binds the configured key to a caller-provided transport.
    pub fn new_with_client(client: T, config: AwsKmsSignerConfig) -> Self {
        Self { config, client }
    }

    /// Fetches the public key for the configured key and derives its EVM
    /// address.
    pub async fn get_evm_address(&self) -> AwsKmsResult<EvmAddress> {
        let der = self.client.get_der_public_key(&self.config.key_id).await?;
        let address = derive_ethereum_address_from_der(&der)
            .map_err(|e| AwsKmsError::ParseError(e.to_string()))?;
        Ok(EvmAddress::new(address))
    }

    /// Signs a 32-byte digest, returning the DER signature produced by KMS.
    pub async fn sign_digest_evm(&self, digest: [u8; 32]) -> AwsKmsResult<Vec<u8>> {
        self.client.sign_digest(&self.config.key_id, digest).await
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    use k256::{
        ecdsa::SigningKey,
        pkcs8::{der::Encode, EncodePublicKey},
    };
    use mockall::predicate::{eq, ne};

    use crate::utils::decode_ecdsa_signature;

    /// Private key 1; its address is a well-known vector.
    pub fn test_key_bytes() -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes[31] = 0x01;
        bytes
    }

    pub fn test_key_address() -> EvmAddress {
        EvmAddress::new([
            126, 95, 69, 82, 9, 26, 105, 18, 93, 93, 252, 183, 184, 194, 101, 144, 41, 57, 91,
            223,
        ])
    }

    pub fn test_config() -> AwsKmsSignerConfig {
        AwsKmsSignerConfig {
            region: Some("us-east-1".to_string()),
            key_id: "test-key-id".to_string(),
            ..Default::default()
        }
    }

    pub fn setup_mock_kms_client() -> (MockAwsKmsK256, SigningKey) {
        let mut client = MockAwsKmsK256::new();
        let signing_key = SigningKey::from_slice(&test_key_bytes()).unwrap();
        let der_pk = signing_key
            .verifying_key()
            .to_public_key_der()
            .unwrap()
            .to_der()
            .unwrap();

        client
            .expect_get_der_public_key()
            .with(eq("test-key-id"))
            .return_const(Ok(der_pk));
        client
            .expect_get_der_public_key()
            .with(ne("test-key-id"))
            .return_const(Err(AwsKmsError::KeyFetchFailed(
                "Key does not exist".to_string(),
            )));

        client
            .expect_sign_digest()
            .withf(|key_id, _| key_id.ne("test-key-id"))
            .return_const(Err(AwsKmsError::RemoteSignFailed(
                "Key does not exist".to_string(),
            )));

        let key = signing_key.clone();
        client
            .expect_sign_digest()
            .withf(|key_id, _| key_id.eq("test-key-id"))
            .returning(move |_, digest| {
                let (signature, _) = signing_key
                    .sign_prehash_recoverable(&digest)
                    .map_err(|e| AwsKmsError::RemoteSignFailed(e.to_string()))?;
                Ok(signature.to_der().as_bytes().to_vec())
            });

        (client, key)
    }

    #[tokio::test]
    async fn test_get_evm_address() {
        let (mock_client, _) = setup_mock_kms_client();
        let kms = AwsKmsService::new_with_client(mock_client, test_config());

        let address = kms.get_evm_address().await.unwrap();
        assert_eq!(address, test_key_address());
    }

    #[tokio::test]
    async fn test_get_evm_address_unknown_key() {
        let (mock_client, _) = setup_mock_kms_client();
        let kms = AwsKmsService::new_with_client(
            mock_client,
            AwsKmsSignerConfig {
                key_id: "invalid-key-id".to_string(),
                ..test_config()
            },
        );

        let result = kms.get_evm_address().await;
        assert!(matches!(result, Err(AwsKmsError::KeyFetchFailed(_))));
    }

    #[tokio::test]
    async fn test_sign_digest_returns_decodable_der() {
        let (mock_client, _) = setup_mock_kms_client();
        let kms = AwsKmsService::new_with_client(mock_client, test_config());

        let der = kms.sign_digest_evm([0x42; 32]).await.unwrap();
        let (r, s) = decode_ecdsa_signature(&der).unwrap();
        assert!(!r.is_empty() && r.len() <= 32);
        assert!(!s.is_empty() && s.len() <= 32);
    }

    #[tokio::test]
    async fn test_sign_digest_unknown_key() {
        let (mock_client, _) = setup_mock_kms_client();
        let kms = AwsKmsService::new_with_client(
            mock_client,
            AwsKmsSignerConfig {
                key_id: "invalid-key-id".to_string(),
                ..test_config()
            },
        );

        let result = kms.sign_digest_evm([0x42; 32]).await;
        assert!(matches!(result, Err(AwsKmsError::RemoteSignFailed(_))));
    }
}

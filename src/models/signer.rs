//! Signer configuration models.

use serde::Deserialize;

use crate::models::SecretString;

/// Configuration for an AWS KMS-backed signer.
///
/// When `region` is unset the default AWS region provider chain is used.
/// Explicit static credentials are optional; most deployments rely on the
/// ambient credential chain (environment, profile, instance role) instead.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AwsKmsSignerConfig {
    pub region: Option<String>,
    pub key_id: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<SecretString>,
    pub session_token: Option<SecretString>,
}

//! Derivation of EVM addresses from secp256k1 public keys.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde::Serialize;
use sha3::{Digest, Keccak256};

use super::der::{extract_public_key_from_der, DerError};

#[derive(Debug, Clone, thiserror::Error, Serialize)]
pub enum AddressDerivationError {
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
}

impl From<DerError> for AddressDerivationError {
    fn from(e: DerError) -> Self {
        AddressDerivationError::InvalidPublicKey(e.to_string())
    }
}

fn address_from_public_key(public_key: &k256::PublicKey) -> [u8; 20] {
    let point = public_key.to_encoded_point(false);

    let mut hasher = Keccak256::new();
    // Skip the 0x04 marker; the address hashes the bare X || Y pair.
    hasher.update(&point.as_bytes()[1..]);
    let hash = hasher.finalize();

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[hash.len() - 20..]);
    address
}

/// Derives the EVM address for a SEC1-encoded secp256k1 point.
///
/// Compressed points are decompressed against the curve equation, the
/// prefix byte selecting the Y parity. The address is the low 20 bytes of
/// the Keccak-256 hash of the uncompressed coordinate pair.
pub fn derive_ethereum_address(point: &[u8]) -> Result<[u8; 20], AddressDerivationError> {
    let public_key = k256::PublicKey::from_sec1_bytes(point).map_err(|e| {
        AddressDerivationError::InvalidPublicKey(format!("point is not on the curve: {e}"))
    })?;
    Ok(address_from_public_key(&public_key))
}

/// Derives the EVM address from the DER/SPKI public key blob returned by
/// KMS.
pub fn derive_ethereum_address_from_der(der: &[u8]) -> Result<[u8; 20], AddressDerivationError> {
    let public_key = extract_public_key_from_der(der)?;
    Ok(address_from_public_key(&public_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    use k256::{
        ecdsa::SigningKey,
        pkcs8::{der::Encode, EncodePublicKey},
    };

    // Generator point of secp256k1; the public key of private key 1.
    const GENERATOR_X: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const GENERATOR_Y: &str = "483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8";

    // Well-known address of private key 1.
    const GENERATOR_ADDRESS: &str = "7e5f4552091a69125d5dfcb7b8c2659029395bdf";

    fn generator_uncompressed() -> Vec<u8> {
        let mut point = vec![0x04];
        point.extend_from_slice(&hex::decode(GENERATOR_X).unwrap());
        point.extend_from_slice(&hex::decode(GENERATOR_Y).unwrap());
        point
    }

    fn generator_compressed() -> Vec<u8> {
        // Y is even, so the compressed prefix is 0x02.
        let mut point = vec![0x02];
        point.extend_from_slice(&hex::decode(GENERATOR_X).unwrap());
        point
    }

    #[test]
    fn test_derive_from_uncompressed_known_vector() {
        let address = derive_ethereum_address(&generator_uncompressed()).unwrap();
        assert_eq!(hex::encode(address), GENERATOR_ADDRESS);
    }

    #[test]
    fn test_compressed_and_uncompressed_agree() {
        let from_compressed = derive_ethereum_address(&generator_compressed()).unwrap();
        let from_uncompressed = derive_ethereum_address(&generator_uncompressed()).unwrap();
        assert_eq!(from_compressed, from_uncompressed);
    }

    #[test]
    fn test_decompression_round_trip() {
        let public_key = k256::PublicKey::from_sec1_bytes(&generator_compressed()).unwrap();
        let point = public_key.to_encoded_point(false);
        assert_eq!(point.as_bytes(), generator_uncompressed().as_slice());
    }

    #[test]
    fn test_rejects_point_off_curve() {
        // Tamper with Y so the coordinates no longer satisfy the curve
        // equation.
        let mut point = generator_uncompressed();
        point[64] ^= 0x01;
        let result = derive_ethereum_address(&point);
        assert!(matches!(
            result,
            Err(AddressDerivationError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn test_rejects_x_outside_field() {
        let mut point = vec![0x03];
        point.extend_from_slice(&[0xff; 32]);
        let result = derive_ethereum_address(&point);
        assert!(matches!(
            result,
            Err(AddressDerivationError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_length() {
        let result = derive_ethereum_address(&[0x04; 10]);
        assert!(matches!(
            result,
            Err(AddressDerivationError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn test_derive_from_der_matches_point_derivation() {
        let signing_key = SigningKey::from_slice(&[0x42u8; 32]).unwrap();
        let spki = signing_key
            .verifying_key()
            .to_public_key_der()
            .unwrap()
            .to_der()
            .unwrap();
        let point = signing_key.verifying_key().to_encoded_point(false);

        let from_der = derive_ethereum_address_from_der(&spki).unwrap();
        let from_point = derive_ethereum_address(point.as_bytes()).unwrap();
        assert_eq!(from_der, from_point);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let first = derive_ethereum_address(&generator_uncompressed()).unwrap();
        let second = derive_ethereum_address(&generator_uncompressed()).unwrap();
        assert_eq!(first, second);
    }
}

//! EVM transaction models and conversions into `alloy` consensus types.

use std::str::FromStr;

use alloy::{
    consensus::{TxEip1559, TxLegacy},
    eips::eip2930::AccessList,
    primitives::{Address as AlloyAddress, Bytes, TxKind, U256},
};
use serde::{Deserialize, Serialize};

use crate::models::TransactionError;

/// Signature parts attached to a signed transaction response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvmTransactionDataSignature {
    pub r: String,
    pub s: String,
    pub v: u64,
    pub sig: String,
}

impl From<&[u8; 65]> for EvmTransactionDataSignature {
    fn from(bytes: &[u8; 65]) -> Self {
        Self {
            r: hex::encode(&bytes[0..32]),
            s: hex::encode(&bytes[32..64]),
            v: bytes[64] as u64,
            sig: hex::encode(bytes),
        }
    }
}

/// An unsigned EVM transaction as submitted by a caller.
///
/// Legacy and EIP-1559 transactions share this shape; the presence of the
/// EIP-1559 fee fields decides which consensus type it converts into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvmTransactionData {
    pub from: String,
    pub to: Option<String>,
    pub gas_price: Option<u128>,
    pub gas_limit: Option<u64>,
    pub nonce: Option<u64>,
    pub value: U256,
    pub data: Option<String>,
    pub chain_id: u64,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
}

impl EvmTransactionData {
    pub fn is_eip1559(&self) -> bool {
        self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some()
    }
}

fn parse_to_field(to: &Option<String>) -> Result<TxKind, TransactionError> {
    match to {
        Some(address) if !address.is_empty() => {
            let parsed = AlloyAddress::from_str(address).map_err(|e| {
                TransactionError::ConversionError(format!("Invalid to address: {e}"))
            })?;
            Ok(TxKind::Call(parsed))
        }
        _ => Ok(TxKind::Create),
    }
}

fn parse_data_field(data: &Option<String>) -> Result<Bytes, TransactionError> {
    match data {
        Some(data) if !data.is_empty() => Bytes::from_str(data)
            .map_err(|e| TransactionError::ConversionError(format!("Invalid data field: {e}"))),
        _ => Ok(Bytes::new()),
    }
}

fn require<T>(field: Option<T>, name: &str) -> Result<T, TransactionError> {
    field.ok_or_else(|| {
        TransactionError::ValidationError(format!("{name} is required for signing"))
    })
}

impl TryFrom<&EvmTransactionData> for TxLegacy {
    type Error = TransactionError;

    fn try_from(tx: &EvmTransactionData) -> Result<Self, Self::Error> {
        Ok(TxLegacy {
            chain_id: Some(tx.chain_id),
            nonce: require(tx.nonce, "nonce")?,
            gas_price: require(tx.gas_price, "gas_price")?,
            gas_limit: require(tx.gas_limit, "gas_limit")?,
            to: parse_to_field(&tx.to)?,
            value: tx.value,
            input: parse_data_field(&tx.data)?,
        })
    }
}

impl TryFrom<&EvmTransactionData> for TxEip1559 {
    type Error = TransactionError;

    fn try_from(tx: &EvmTransactionData) -> Result<Self, Self::Error> {
        Ok(TxEip1559 {
            chain_id: tx.chain_id,
            nonce: require(tx.nonce, "nonce")?,
            gas_limit: require(tx.gas_limit, "gas_limit")?,
            max_fee_per_gas: require(tx.max_fee_per_gas, "max_fee_per_gas")?,
            max_priority_fee_per_gas: require(
                tx.max_priority_fee_per_gas,
                "max_priority_fee_per_gas",
            )?,
            to: parse_to_field(&tx.to)?,
            value: tx.value,
            access_list: AccessList::default(),
            input: parse_data_field(&tx.data)?,
        })
    }
}

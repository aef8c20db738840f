//! Typed responses (and the few wire-level argument types) for the daemon
//! method surface.
//!
//! Only the fields the harness actually consumes are modeled; unknown
//! fields are ignored on deserialization so the client stays compatible
//! across daemon versions. Amounts are JSON numbers (`f64`); the harness
//! operates on small integral regtest units.

use serde::{Deserialize, Serialize};

/// A spendable output reference: the input form `{txid, vout}` expected by
/// `createrawtransaction` and `lockunspent`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnspentRef {
    /// Transaction that created the output.
    pub txid: String,
    /// Output index within that transaction.
    pub vout: u32,
}

/// An [`UnspentRef`] plus the output's locking script, as required by
/// `signrawtransaction` prevout details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentDetail {
    pub txid: String,
    pub vout: u32,
    /// Hex-encoded scriptPubKey the signer is authorizing against.
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: String,
}

/// One entry from `listunspent`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListUnspentEntry {
    pub txid: String,
    pub vout: u32,
    #[serde(default)]
    pub address: Option<String>,
    pub amount: f64,
    /// Asset identifier; present on multi-asset daemons only.
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(rename = "scriptPubKey", default)]
    pub script_pub_key: Option<String>,
    #[serde(default)]
    pub confirmations: Option<u64>,
}

impl ListUnspentEntry {
    /// The `{txid, vout}` pair usable as a raw-transaction input.
    pub fn to_ref(&self) -> UnspentRef {
        UnspentRef {
            txid: self.txid.clone(),
            vout: self.vout,
        }
    }
}

/// Result of `validateaddress`.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateAddressResult {
    pub isvalid: bool,
    /// Public key behind the address, when the wallet knows it.
    #[serde(default)]
    pub pubkey: Option<String>,
    /// Unblinded form of a confidential address (multi-asset daemons).
    #[serde(default)]
    pub unconfidential: Option<String>,
}

/// Result of `fundrawtransaction`.
#[derive(Debug, Clone, Deserialize)]
pub struct FundRawTransactionResult {
    /// The funded raw transaction.
    pub hex: String,
    #[serde(default)]
    pub fee: Option<f64>,
    #[serde(default)]
    pub changepos: Option<i64>,
}

/// Result of `signrawtransaction`.
#[derive(Debug, Clone, Deserialize)]
pub struct SignRawTransactionResult {
    /// The (possibly still partially signed) raw transaction.
    pub hex: String,
    /// True once every input carries a valid signature. Intermediate
    /// multi-party signing steps legitimately report `false`.
    pub complete: bool,
}

/// Result of `combineblocksigs`.
#[derive(Debug, Clone, Deserialize)]
pub struct CombineBlockSigsResult {
    /// Block with the signatures folded in.
    pub hex: String,
    pub complete: bool,
}

/// Result of `issueasset`.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueAssetResult {
    /// On-chain identifier of the newly issued asset.
    pub asset: String,
    /// Reissuance token identifier, if any was created.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub txid: Option<String>,
}

/// One output of a decoded transaction (`getrawtransaction` verbose form).
#[derive(Debug, Clone, Deserialize)]
pub struct DecodedTxOut {
    pub n: u32,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: DecodedScriptPubKey,
}

/// The scriptPubKey object inside a decoded output.
#[derive(Debug, Clone, Deserialize)]
pub struct DecodedScriptPubKey {
    pub hex: String,
    #[serde(rename = "type", default)]
    pub script_type: Option<String>,
}

/// A decoded transaction; only the outputs are consumed.
#[derive(Debug, Clone, Deserialize)]
pub struct DecodedTransaction {
    #[serde(default)]
    pub txid: Option<String>,
    pub vout: Vec<DecodedTxOut>,
}

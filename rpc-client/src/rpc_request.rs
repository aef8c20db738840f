//! JSON-RPC 1.0 request framing.
//!
//! Bitcoin-Core-style daemons speak positional-parameter JSON-RPC 1.0:
//!
//! ```text
//! {"id": 7, "method": "listunspent", "params": [0, 9999999]}
//! ```
//!
//! The version field is omitted, per the original 1.0 convention; daemons
//! accept it either way and 2.0-only test servers reject `"1.0"`.
//!
//! [`RpcRequest`] enumerates every method the harness consumes (treated as a
//! fixed external contract) and maps each variant to its wire name.

use {serde_json::Value, std::fmt};

/// The daemon method surface consumed by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcRequest {
    CombineBlockSigs,
    CreateRawTransaction,
    DecodeRawTransaction,
    DumpPrivKey,
    FundRawTransaction,
    Generate,
    GetBlockCount,
    GetNewAddress,
    GetNewBlockHex,
    GetRawTransaction,
    GetWalletInfo,
    ImportAddress,
    ImportPrivKey,
    IssueAsset,
    ListUnspent,
    LockUnspent,
    ReissueAsset,
    SendRawTransaction,
    SendToAddress,
    SignBlock,
    SignRawTransaction,
    Stop,
    SubmitBlock,
    ValidateAddress,
}

impl RpcRequest {
    /// Wire-level method name.
    pub fn method(self) -> &'static str {
        match self {
            RpcRequest::CombineBlockSigs => "combineblocksigs",
            RpcRequest::CreateRawTransaction => "createrawtransaction",
            RpcRequest::DecodeRawTransaction => "decoderawtransaction",
            RpcRequest::DumpPrivKey => "dumpprivkey",
            RpcRequest::FundRawTransaction => "fundrawtransaction",
            RpcRequest::Generate => "generate",
            RpcRequest::GetBlockCount => "getblockcount",
            RpcRequest::GetNewAddress => "getnewaddress",
            RpcRequest::GetNewBlockHex => "getnewblockhex",
            RpcRequest::GetRawTransaction => "getrawtransaction",
            RpcRequest::GetWalletInfo => "getwalletinfo",
            RpcRequest::ImportAddress => "importaddress",
            RpcRequest::ImportPrivKey => "importprivkey",
            RpcRequest::IssueAsset => "issueasset",
            RpcRequest::ListUnspent => "listunspent",
            RpcRequest::LockUnspent => "lockunspent",
            RpcRequest::ReissueAsset => "reissueasset",
            RpcRequest::SendRawTransaction => "sendrawtransaction",
            RpcRequest::SendToAddress => "sendtoaddress",
            RpcRequest::SignBlock => "signblock",
            RpcRequest::SignRawTransaction => "signrawtransaction",
            RpcRequest::Stop => "stop",
            RpcRequest::SubmitBlock => "submitblock",
            RpcRequest::ValidateAddress => "validateaddress",
        }
    }

    /// Build the full JSON-RPC 1.0 request body.
    ///
    /// `params` must be a JSON array (positional parameters).
    pub fn build_request_json(self, id: u64, params: Value) -> Value {
        serde_json::json!({
            "id": id,
            "method": self.method(),
            "params": params,
        })
    }
}

impl fmt::Display for RpcRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

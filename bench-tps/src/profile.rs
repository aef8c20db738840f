//! Target-node profile: every node-flavor decision, resolved once.
//!
//! Single-asset and multi-asset daemons disagree on fee accounting,
//! broadcast strictness, address confidentiality, and (sometimes) block
//! production. Rather than re-checking the flavor at every call site, the
//! harness resolves a [`TargetProfile`] at startup and threads it through
//! each component.

use {
    crate::error::Result,
    sidechain_rpc_client::{ListUnspentEntry, RpcClient, UnspentRef},
};

/// Widest confirmation window the daemons accept; their own default.
pub const MAX_CONFIRMATIONS: u64 = 9_999_999;

/// Zero: anything that has entered the node at all counts as spendable
/// for harness purposes.
pub const MIN_CONFIRMATIONS: u64 = 0;

/// Label multi-asset daemons accept for the native currency. The raw hex
/// asset id changes per run under a block-signing script, so the symbolic
/// label is the only stable handle.
pub const NATIVE_ASSET_LABEL: &str = "bitcoin";

/// How the daemon accounts for transaction fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeModel {
    /// Multi-asset daemons: every transaction carries an explicit `"fee"`
    /// output and each asset must balance exactly.
    Explicit,
    /// Single-asset daemons: any input value not consumed by outputs is
    /// the fee; explicit `"fee"` outputs are rejected.
    ImplicitLeftover,
}

/// How the harness advances the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmMode {
    /// The node exposes a one-shot `generate n` capability.
    Generate,
    /// Signed-block consensus: each block must be built, signed with the
    /// designated key, combined, and submitted manually.
    SignedBlocks,
}

/// Node-flavor capabilities, fixed for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct TargetProfile {
    pub fee_model: FeeModel,
    pub confirm_mode: ConfirmMode,
    /// Asset filter applied to UTXO listings; `None` on single-asset nodes.
    pub default_asset: Option<String>,
    /// Whether fresh addresses are confidential and must be unblinded
    /// before use in raw transactions.
    pub unblind_addresses: bool,
}

impl TargetProfile {
    /// Profile for a Bitcoin-Core-style single-asset daemon.
    pub fn single_asset(confirm_mode: ConfirmMode) -> Self {
        Self {
            fee_model: FeeModel::ImplicitLeftover,
            confirm_mode,
            default_asset: None,
            unblind_addresses: false,
        }
    }

    /// Profile for an Elements-style multi-asset daemon.
    pub fn multi_asset(confirm_mode: ConfirmMode) -> Self {
        Self {
            fee_model: FeeModel::Explicit,
            confirm_mode,
            default_asset: Some(NATIVE_ASSET_LABEL.to_string()),
            unblind_addresses: true,
        }
    }

    /// The third `sendrawtransaction` argument: multi-asset daemons must
    /// be told to accept unblinded outputs; single-asset daemons reject a
    /// third argument altogether.
    pub fn broadcast_unblinded_opt(&self) -> Option<bool> {
        match self.fee_model {
            FeeModel::Explicit => Some(true),
            FeeModel::ImplicitLeftover => None,
        }
    }

    /// A fresh receive address, unblinded when the profile requires it.
    pub fn unblinded_address(&self, wallet: &RpcClient) -> Result<String> {
        let address = wallet.get_new_address()?;
        if !self.unblind_addresses {
            return Ok(address);
        }
        let validated = wallet.validate_address(&address)?;
        // A confidential address without an unconfidential form means the
        // daemon flavor was misdetected; fall back to the address itself.
        Ok(validated.unconfidential.unwrap_or(address))
    }

    /// List spendable outputs at `addresses`, filtered to `asset` (or the
    /// profile's default asset) on multi-asset nodes.
    pub fn list_unspent(
        &self,
        node: &RpcClient,
        addresses: &[String],
        asset: Option<&str>,
    ) -> Result<Vec<ListUnspentEntry>> {
        let entries = match self.fee_model {
            FeeModel::ImplicitLeftover => {
                node.list_unspent(MIN_CONFIRMATIONS, MAX_CONFIRMATIONS, addresses, None, None)?
            }
            FeeModel::Explicit => {
                let asset = asset.or(self.default_asset.as_deref());
                node.list_unspent(
                    MIN_CONFIRMATIONS,
                    MAX_CONFIRMATIONS,
                    addresses,
                    Some(true),
                    asset,
                )?
            }
        };
        Ok(entries)
    }

    /// Like [`TargetProfile::list_unspent`], reduced to `{txid, vout}`
    /// input pairs.
    pub fn unspent_refs(
        &self,
        node: &RpcClient,
        addresses: &[String],
        asset: Option<&str>,
    ) -> Result<Vec<UnspentRef>> {
        Ok(self
            .list_unspent(node, addresses, asset)?
            .iter()
            .map(ListUnspentEntry::to_ref)
            .collect())
    }

    /// Sum of spendable value at `addresses` for the given asset.
    pub fn spendable_balance(
        &self,
        node: &RpcClient,
        addresses: &[String],
        asset: Option<&str>,
    ) -> Result<f64> {
        Ok(self
            .list_unspent(node, addresses, asset)?
            .iter()
            .map(|entry| entry.amount)
            .sum())
    }
}

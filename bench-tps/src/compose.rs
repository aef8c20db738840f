//! Raw-transaction composition.
//!
//! [`OutputSet`] is the destination → amount mapping handed to
//! `createrawtransaction`, with the daemons' two reserved literals
//! (`"fee"`, `"data"`) and optional per-destination asset tags.
//! [`compose`] normalizes the set for the active fee model and produces an
//! unsigned (but funded) raw transaction; [`transact`] runs the full
//! compose → multi-sign → broadcast pipeline.

use {
    crate::{
        confirm::ConfirmationDriver,
        error::Result,
        profile::{FeeModel, TargetProfile},
        sign::{sign_all, Signer},
    },
    log::debug,
    serde_json::{json, Map, Value},
    sidechain_rpc_client::{RpcClient, UnspentRef},
};

/// Reserved destination literal for the explicit fee output.
pub const FEE_KEY: &str = "fee";

/// Reserved destination literal for an embedded-data (nulldata) output.
pub const DATA_KEY: &str = "data";

/// Locktime passed to every `createrawtransaction` call.
const RAW_TX_LOCKTIME: u64 = 1;

/// An ordered destination → amount mapping plus asset tags.
///
/// Insertion order is preserved on the wire (the daemon turns object
/// order into output order). Amounts are JSON numbers except for the
/// `"data"` entry, whose value is the hex payload itself.
#[derive(Debug, Clone, Default)]
pub struct OutputSet {
    outputs: Map<String, Value>,
    assets: Map<String, Value>,
}

impl OutputSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pay `amount` to `dest`.
    pub fn pay(mut self, dest: &str, amount: f64) -> Self {
        self.outputs.insert(dest.to_string(), json!(amount));
        self
    }

    /// Add an explicit fee output (stripped automatically on
    /// implicit-leftover targets).
    pub fn fee(self, amount: f64) -> Self {
        self.pay(FEE_KEY, amount)
    }

    /// Embed `hex` in a nulldata output.
    pub fn embed_data(mut self, hex: &str) -> Self {
        self.outputs.insert(DATA_KEY.to_string(), json!(hex));
        self
    }

    /// Tag the output paying `dest` with an asset identifier. Multi-asset
    /// daemons type outputs by destination address, hence the parallel map.
    pub fn tag_asset(mut self, dest: &str, asset_id: &str) -> Self {
        self.assets.insert(dest.to_string(), json!(asset_id));
        self
    }

    /// The explicit fee amount, if one was set.
    pub fn fee_amount(&self) -> Option<f64> {
        self.outputs.get(FEE_KEY).and_then(Value::as_f64)
    }

    /// Number of entries, reserved literals included.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// The wire-level outputs object for the given fee model.
    ///
    /// Implicit-leftover targets infer the fee from unconsumed input and
    /// reject an explicit `"fee"` entry, so it is stripped; explicit-fee
    /// targets require it for balanced per-asset accounting. Exactly one
    /// of the two treatments applies per target, never both.
    pub fn for_fee_model(&self, fee_model: FeeModel) -> Map<String, Value> {
        match fee_model {
            FeeModel::Explicit => self.outputs.clone(),
            FeeModel::ImplicitLeftover => self
                .outputs
                .iter()
                .filter(|(dest, _)| dest.as_str() != FEE_KEY)
                .map(|(dest, amount)| (dest.clone(), amount.clone()))
                .collect(),
        }
    }

    /// The asset-tag map, or `None` when no tagging applies (single-asset
    /// daemons reject the extra argument).
    pub fn asset_map(&self, fee_model: FeeModel) -> Option<&Map<String, Value>> {
        match fee_model {
            FeeModel::Explicit => Some(&self.assets),
            FeeModel::ImplicitLeftover => None,
        }
    }
}

/// Build an unsigned raw transaction consuming `inputs` and producing
/// `outputs`.
///
/// With an empty `inputs` slice the wallet funds the transaction itself
/// (`fundrawtransaction`), so the result is never a zero-input blob; this
/// is the bootstrap path for seeding parties from the wallet balance.
/// One RPC round-trip, two when auto-funding.
pub fn compose(
    node: &RpcClient,
    profile: &TargetProfile,
    inputs: &[UnspentRef],
    outputs: &OutputSet,
) -> Result<String> {
    let wire_outputs = outputs.for_fee_model(profile.fee_model);
    let raw = node.create_raw_transaction(
        inputs,
        &wire_outputs,
        RAW_TX_LOCKTIME,
        outputs.asset_map(profile.fee_model),
    )?;

    if inputs.is_empty() {
        debug!("composing auto-funded transaction ({} outputs)", wire_outputs.len());
        return Ok(node.fund_raw_transaction(&raw)?.hex);
    }
    Ok(raw)
}

/// Compose, collect every signer's signature, and broadcast.
///
/// Returns the broadcast transaction id. Any failure along the pipeline
/// aborts the submission; nothing is retried.
pub fn transact(
    driver: &ConfirmationDriver<'_>,
    inputs: &[UnspentRef],
    outputs: &OutputSet,
    signers: &[Signer<'_>],
) -> Result<String> {
    let raw = compose(driver.node(), driver.profile(), inputs, outputs)?;
    let signed = sign_all(driver.node(), raw, inputs, signers)?;
    driver.submit(&signed)
}

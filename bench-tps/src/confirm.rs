//! Broadcast and chain advancement.
//!
//! The driver owns the two chain-state transitions the harness performs:
//! submitting a signed transaction into the mempool, and confirming the
//! mempool into blocks. The confirmation mode is fixed by the
//! [`TargetProfile`] at startup: either the node's one-shot `generate`,
//! or the manual template → sign → combine → submit sequence that
//! signed-block consensus demands. A failure in either path leaves chain
//! state ambiguous and is fatal; nothing is retried.

use {
    crate::{
        error::{HarnessError, Result},
        profile::{ConfirmMode, TargetProfile},
    },
    log::debug,
    sidechain_rpc_client::RpcClient,
};

/// Submits transactions and advances the chain on one node.
pub struct ConfirmationDriver<'a> {
    node: &'a RpcClient,
    profile: &'a TargetProfile,
}

impl<'a> ConfirmationDriver<'a> {
    pub fn new(node: &'a RpcClient, profile: &'a TargetProfile) -> Self {
        Self { node, profile }
    }

    pub fn node(&self) -> &'a RpcClient {
        self.node
    }

    pub fn profile(&self) -> &'a TargetProfile {
        self.profile
    }

    /// Broadcast a fully signed transaction with the profile's override
    /// options (oversized fees always; unblinded outputs on multi-asset
    /// targets). Returns the transaction id.
    ///
    /// A node-side rejection (missing signature, imbalanced outputs)
    /// comes back as the underlying RPC error.
    pub fn submit(&self, signed_tx: &str) -> Result<String> {
        let txid =
            self.node
                .send_raw_transaction(signed_tx, true, self.profile.broadcast_unblinded_opt())?;
        debug!("broadcast {txid}");
        Ok(txid)
    }

    /// Confirm the mempool into `n` new blocks. Advancing by zero blocks
    /// is a no-op by definition.
    pub fn advance_chain(&self, n: u64) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        match self.profile.confirm_mode {
            ConfirmMode::Generate => {
                self.node
                    .generate(n)
                    .map_err(|e| HarnessError::Confirmation(format!("generate({n}): {e}")))?;
            }
            ConfirmMode::SignedBlocks => {
                for _ in 0..n {
                    self.produce_signed_block()?;
                }
            }
        }
        Ok(())
    }

    /// One round of the manual signed-block sequence, using the node's
    /// single designated block-signing key.
    fn produce_signed_block(&self) -> Result<()> {
        let template = self
            .node
            .get_new_block_hex()
            .map_err(|e| HarnessError::Confirmation(format!("block template: {e}")))?;
        let signature = self
            .node
            .sign_block(&template)
            .map_err(|e| HarnessError::Confirmation(format!("block signing: {e}")))?;
        let combined = self
            .node
            .combine_block_sigs(&template, &[signature])
            .map_err(|e| HarnessError::Confirmation(format!("combining signatures: {e}")))?;
        let verdict = self
            .node
            .submit_block(&combined.hex)
            .map_err(|e| HarnessError::Confirmation(format!("block submission: {e}")))?;
        // submitblock answers null on acceptance and a reason string on
        // rejection, without raising an RPC error.
        if !verdict.is_null() {
            return Err(HarnessError::Confirmation(format!(
                "block rejected: {verdict}"
            )));
        }
        Ok(())
    }
}

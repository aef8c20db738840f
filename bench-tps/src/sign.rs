//! Multi-signer coordination.
//!
//! A transaction spending outputs owned by different parties (say a
//! buyer's payment input and a seller's certificate input) needs each
//! party's wallet to sign over the inputs it owns. Signers are applied
//! sequentially in caller order; each step re-signs the progressively
//! signed blob with that party's own prevout details. The final blob is
//! judged by the node at broadcast: an omitted signer surfaces as a
//! broadcast rejection, not a client-side check.

use {
    crate::error::{HarnessError, Result},
    log::debug,
    sidechain_rpc_client::{RpcClient, UnspentDetail, UnspentRef},
};

/// One independent key-holder contributing signatures.
pub struct Signer<'a> {
    /// The wallet (its own RPC connection) holding this party's keys.
    pub wallet: &'a RpcClient,
    /// Locking scripts of the inputs this party owns. When absent they
    /// are derived on demand from the primary node's transaction index.
    pub details: Option<Vec<UnspentDetail>>,
}

impl<'a> Signer<'a> {
    pub fn new(wallet: &'a RpcClient) -> Self {
        Self {
            wallet,
            details: None,
        }
    }

    pub fn with_details(wallet: &'a RpcClient, details: Vec<UnspentDetail>) -> Self {
        Self {
            wallet,
            details: Some(details),
        }
    }
}

/// Derive prevout details for `inputs` by looking each one's transaction
/// up on `node` and extracting the consumed output's locking script.
pub fn lookup_details(node: &RpcClient, inputs: &[UnspentRef]) -> Result<Vec<UnspentDetail>> {
    inputs
        .iter()
        .map(|input| {
            let decoded = node.get_raw_transaction_verbose(&input.txid).map_err(|e| {
                HarnessError::Signing(format!(
                    "cannot resolve input {}:{}: {e}",
                    input.txid, input.vout
                ))
            })?;
            let output = decoded
                .vout
                .iter()
                .find(|out| out.n == input.vout)
                .ok_or_else(|| {
                    HarnessError::Signing(format!(
                        "transaction {} has no output {}",
                        input.txid, input.vout
                    ))
                })?;
            Ok(UnspentDetail {
                txid: input.txid.clone(),
                vout: input.vout,
                script_pub_key: output.script_pub_key.hex.clone(),
            })
        })
        .collect()
}

/// Apply every signer to `raw_tx` in order, returning the fully signed
/// blob.
///
/// Intermediate steps legitimately report `complete == false` while
/// signatures are still missing; only the broadcast decides validity.
pub fn sign_all(
    node: &RpcClient,
    raw_tx: String,
    inputs: &[UnspentRef],
    signers: &[Signer<'_>],
) -> Result<String> {
    let mut blob = raw_tx;
    for (index, signer) in signers.iter().enumerate() {
        let derived;
        let details: &[UnspentDetail] = match &signer.details {
            Some(details) => details,
            None => {
                derived = lookup_details(node, inputs)?;
                &derived
            }
        };
        let signed = signer
            .wallet
            .sign_raw_transaction(&blob, details)
            .map_err(|e| HarnessError::Signing(format!("signer {index} rejected: {e}")))?;
        if !signed.complete {
            debug!("signer {index} left transaction incomplete (more signers expected)");
        }
        blob = signed.hex;
    }
    Ok(blob)
}

//! Seeding and the atomic-swap scenario.
//!
//! Before the benchmark runs, the harness seeds two parties from the
//! wallet balance, then (on multi-asset targets) stages a purchase: a
//! one-unit certificate asset is issued and swapped against the buyer's
//! payment in a single transaction carrying two independent signatures.
//! Expected balances are checked against the node's UTXO set afterwards,
//! not against client-side bookkeeping.

use {
    crate::{
        compose::{transact, OutputSet},
        confirm::ConfirmationDriver,
        error::{HarnessError, Result},
        sign::{lookup_details, Signer},
    },
    log::{debug, info},
    sidechain_rpc_client::RpcClient,
};

/// Balances differing by less than this from expectation count as equal.
const BALANCE_EPSILON: f64 = 1e-8;

/// The amounts moved by the swap scenario.
#[derive(Debug, Clone, Copy)]
pub struct SwapAmounts {
    /// Starting balance granted to each party.
    pub seed: f64,
    /// Price paid to the seller.
    pub transfer: f64,
    /// Marketplace cut.
    pub marketplace_cut: f64,
    /// Flat fee per transaction.
    pub fee: f64,
}

impl SwapAmounts {
    /// What remains at the buyer's address after the swap.
    pub fn buyer_change(&self) -> f64 {
        self.seed - self.transfer - self.marketplace_cut - self.fee
    }
}

impl Default for SwapAmounts {
    fn default() -> Self {
        Self {
            seed: 1000.0,
            transfer: 4.0,
            marketplace_cut: 2.0,
            fee: 1.0,
        }
    }
}

/// The scenario's addresses and signing wallets. `alice` buys, `bob`
/// sells, the certificate lands at `alice_certs`.
pub struct Participants<'a> {
    pub alice: String,
    pub bob: String,
    /// Certificate delivery address. Multi-asset daemons type outputs by
    /// destination address, so the certificate cannot share the buyer's
    /// change address within one atomic transaction.
    pub alice_certs: String,
    pub marketplace: String,
    pub alice_wallet: &'a RpcClient,
    pub bob_wallet: &'a RpcClient,
}

/// Mint addresses for both parties and the marketplace.
///
/// With `wallets` set, each party gets addresses from its own node and
/// those addresses are imported watch-only into the primary node so its
/// `listunspent` can see them. Otherwise everything lives in the primary
/// wallet.
pub fn setup_participants<'a>(
    driver: &ConfirmationDriver<'a>,
    wallets: Option<(&'a RpcClient, &'a RpcClient)>,
) -> Result<Participants<'a>> {
    let node = driver.node();
    let profile = driver.profile();
    let marketplace = profile.unblinded_address(node)?;

    let participants = match wallets {
        Some((alice_wallet, bob_wallet)) => {
            let alice = profile.unblinded_address(alice_wallet)?;
            let alice_certs = profile.unblinded_address(alice_wallet)?;
            let bob = profile.unblinded_address(bob_wallet)?;
            for address in [&alice, &alice_certs, &bob] {
                node.import_address(address)?;
            }
            Participants {
                alice,
                bob,
                alice_certs,
                marketplace,
                alice_wallet,
                bob_wallet,
            }
        }
        None => Participants {
            alice: profile.unblinded_address(node)?,
            bob: profile.unblinded_address(node)?,
            alice_certs: profile.unblinded_address(node)?,
            marketplace,
            alice_wallet: node,
            bob_wallet: node,
        },
    };
    debug!(
        "participants: alice {}, bob {}, certs {}, marketplace {}",
        participants.alice, participants.bob, participants.alice_certs, participants.marketplace
    );
    Ok(participants)
}

/// Grant `amount` to `address` from the primary wallet balance via an
/// auto-funded transaction.
pub fn seed(driver: &ConfirmationDriver<'_>, address: &str, amount: f64) -> Result<String> {
    let outputs = OutputSet::new().pay(address, amount);
    let txid = transact(driver, &[], &outputs, &[Signer::new(driver.node())])?;
    info!("seeded {address} with {amount} ({txid})");
    Ok(txid)
}

/// Issue a one-unit certificate asset and make it spendable.
///
/// The issuance is wallet-funded, so the parties' UTXOs are locked for
/// its duration to keep them from being raided as inputs. The follow-up
/// `sendtoaddress` micro-send is what turns the freshly issued asset
/// into an output raw transactions can actually consume.
pub fn issue_certificate(
    driver: &ConfirmationDriver<'_>,
    participants: &Participants<'_>,
) -> Result<String> {
    let node = driver.node();
    let profile = driver.profile();
    let protected = profile.unspent_refs(
        node,
        &[
            participants.alice.clone(),
            participants.bob.clone(),
            participants.marketplace.clone(),
        ],
        None,
    )?;
    node.lock_unspent(false, &protected)?;

    let issuance = node.issue_asset(1.0, 0.0, false)?;
    info!("certificate asset {}", issuance.asset);
    node.send_to_address(&participants.marketplace, 1.0, Some(&issuance.asset))?;

    node.lock_unspent(true, &protected)?;
    Ok(issuance.asset)
}

/// The purchase transaction: the buyer's money and the certificate change
/// hands atomically.
///
/// Spends the buyer's money inputs and (with `certificate` set) the
/// certificate input in one transaction, each signed by its own wallet.
/// Outputs: payment to the seller, the marketplace cut, the buyer's
/// change, an embedded `"data"` marker, the explicit fee, and the
/// certificate to the dedicated certificate address.
pub fn atomic_swap(
    driver: &ConfirmationDriver<'_>,
    participants: &Participants<'_>,
    amounts: &SwapAmounts,
    certificate: Option<&str>,
) -> Result<String> {
    let node = driver.node();
    let profile = driver.profile();

    let mut inputs = profile.unspent_refs(node, &[participants.alice.clone()], None)?;
    let mut outputs = OutputSet::new()
        .pay(&participants.bob, amounts.transfer)
        .pay(&participants.marketplace, amounts.marketplace_cut)
        .pay(&participants.alice, amounts.buyer_change())
        .embed_data("feed")
        .fee(amounts.fee);
    let mut signers = vec![Signer::with_details(
        participants.alice_wallet,
        lookup_details(node, &inputs)?,
    )];

    if let Some(asset_id) = certificate {
        let cert_inputs = profile.unspent_refs(node, &[], Some(asset_id))?;
        signers.push(Signer::with_details(
            node,
            lookup_details(node, &cert_inputs)?,
        ));
        inputs.extend(cert_inputs);
        outputs = outputs
            .pay(&participants.alice_certs, 1.0)
            .tag_asset(&participants.alice_certs, asset_id);
    }

    let txid = transact(driver, &inputs, &outputs, &signers)?;
    info!("atomic swap broadcast ({txid})");
    Ok(txid)
}

fn check_balance(
    driver: &ConfirmationDriver<'_>,
    label: &str,
    address: &str,
    asset: Option<&str>,
    expected: f64,
) -> Result<()> {
    let actual =
        driver
            .profile()
            .spendable_balance(driver.node(), &[address.to_string()], asset)?;
    if (actual - expected).abs() > BALANCE_EPSILON {
        return Err(HarnessError::Verification(format!(
            "{label} holds {actual}, expected {expected}"
        )));
    }
    debug!("{label} holds {actual} as expected");
    Ok(())
}

/// Check every post-swap balance against the node's UTXO set.
pub fn verify_swap(
    driver: &ConfirmationDriver<'_>,
    participants: &Participants<'_>,
    amounts: &SwapAmounts,
    certificate: Option<&str>,
) -> Result<()> {
    check_balance(
        driver,
        "buyer",
        &participants.alice,
        None,
        amounts.buyer_change(),
    )?;
    check_balance(
        driver,
        "seller",
        &participants.bob,
        None,
        amounts.seed + amounts.transfer,
    )?;
    check_balance(
        driver,
        "marketplace",
        &participants.marketplace,
        None,
        amounts.marketplace_cut,
    )?;
    if let Some(asset_id) = certificate {
        check_balance(
            driver,
            "certificate holder",
            &participants.alice_certs,
            Some(asset_id),
            1.0,
        )?;
    }
    info!("swap balances verified");
    Ok(())
}

//! The ping-pong throughput benchmark.
//!
//! Two parties shuttle a fixed amount back and forth; every leg is a full
//! compose → sign → broadcast cycle against live UTXO state, so the loop
//! measures the daemon's end-to-end raw-transaction pipeline rather than
//! any client-side shortcut. Client-side balance counters track what each
//! leg *should* leave behind; the node's UTXO set remains authoritative
//! and is re-read at the start of every leg.

use {
    crate::{
        compose::{transact, OutputSet},
        confirm::ConfirmationDriver,
        error::Result,
        sign::Signer,
    },
    log::{debug, info},
    sidechain_rpc_client::RpcClient,
    std::{
        fmt,
        time::{Duration, Instant},
    },
};

/// One benchmark participant: an address, the wallet that can sign for
/// it, and the client-side running balance.
pub struct Party<'a> {
    pub name: &'static str,
    pub address: String,
    pub wallet: &'a RpcClient,
    /// Expected spendable balance after every leg so far. Not
    /// authoritative; verification re-reads the node at the end.
    pub balance: f64,
}

impl<'a> Party<'a> {
    pub fn new(name: &'static str, address: String, wallet: &'a RpcClient, balance: f64) -> Self {
        Self {
            name,
            address,
            wallet,
            balance,
        }
    }
}

/// Tunables for the ping-pong loop. Defaults mirror the harness's
/// historical constants.
#[derive(Debug, Clone)]
pub struct PingPongConfig {
    /// Number of two-leg rounds to time.
    pub rounds: u64,
    /// Legs allowed to share a block; see [`BlockBatcher`].
    pub batch_size: u64,
    /// Amount moved per leg.
    pub amount: f64,
    /// Fee paid per leg.
    pub fee: f64,
}

impl Default for PingPongConfig {
    fn default() -> Self {
        Self {
            rounds: 100,
            // Must stay under the daemon's per-block mempool transaction
            // ceiling (25 in regtest) or legs start getting rejected.
            batch_size: 23,
            amount: 3.0,
            fee: 1.0,
        }
    }
}

/// Decides when the chain should be advanced between legs.
///
/// - `batch_size <= 1`: a block after every leg;
/// - `batch_size == 2`: a block after every round (two legs);
/// - otherwise: legs accumulate and a block is produced once the count
///   exceeds `batch_size`, bounding unconfirmed legs at `batch_size + 1`
///   while letting several transactions share one block.
#[derive(Debug)]
pub struct BlockBatcher {
    batch_size: u64,
    pending: u64,
}

impl BlockBatcher {
    pub fn new(batch_size: u64) -> Self {
        Self {
            batch_size,
            pending: 0,
        }
    }

    /// Record one completed leg; returns true when a block should be
    /// advanced now. `round_complete` marks the second leg of a round.
    pub fn record_leg(&mut self, round_complete: bool) -> bool {
        if self.batch_size <= 1 {
            return true;
        }
        if self.batch_size == 2 {
            return round_complete;
        }
        self.pending += 1;
        if self.pending > self.batch_size {
            self.pending = 0;
            return true;
        }
        false
    }

    /// Legs broadcast since the last advancement.
    pub fn pending(&self) -> u64 {
        self.pending
    }
}

/// Outcome of a completed benchmark run.
#[derive(Debug, Clone)]
pub struct BenchReport {
    pub rounds: u64,
    /// Two legs per round.
    pub transactions: u64,
    pub elapsed: Duration,
    pub tx_per_second: f64,
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timed {} transactions in {:.3}s, {:.2} transactions/second",
            self.transactions,
            self.elapsed.as_secs_f64(),
            self.tx_per_second
        )
    }
}

/// One transfer leg: move `amount` from `sender` to `recipient`, change
/// back to the sender's own address, fee on top.
fn leg(
    driver: &ConfirmationDriver<'_>,
    sender: &mut Party<'_>,
    recipient: &mut Party<'_>,
    amount: f64,
    fee: f64,
) -> Result<()> {
    let inputs =
        driver
            .profile()
            .unspent_refs(driver.node(), &[sender.address.clone()], None)?;
    recipient.balance += amount;
    sender.balance -= amount + fee;
    let outputs = OutputSet::new()
        .pay(&recipient.address, amount)
        .fee(fee)
        .pay(&sender.address, sender.balance);
    let txid = transact(driver, &inputs, &outputs, &[Signer::new(sender.wallet)])?;
    debug!(
        "{} -> {} {amount} (fee {fee}), txid {txid}",
        sender.name, recipient.name
    );
    Ok(())
}

/// Run the ping-pong pattern for exactly `config.rounds` rounds and
/// report wall-clock throughput.
///
/// Any failure inside a round aborts the whole benchmark; partial timing
/// is discarded rather than reported.
pub fn run_ping_pong(
    driver: &ConfirmationDriver<'_>,
    party_a: &mut Party<'_>,
    party_b: &mut Party<'_>,
    config: &PingPongConfig,
) -> Result<BenchReport> {
    info!(
        "ping-pong: {} rounds, amount {}, fee {}, batch size {}",
        config.rounds, config.amount, config.fee, config.batch_size
    );
    let mut batcher = BlockBatcher::new(config.batch_size);
    let start = Instant::now();

    for round in 0..config.rounds {
        leg(driver, party_b, party_a, config.amount, config.fee)?;
        if batcher.record_leg(false) {
            driver.advance_chain(1)?;
        }

        leg(driver, party_a, party_b, config.amount, config.fee)?;
        if batcher.record_leg(true) {
            driver.advance_chain(1)?;
        }

        if round % 25 == 0 {
            debug!(
                "round {round}: {}={}, {}={}",
                party_a.name, party_a.balance, party_b.name, party_b.balance
            );
        }
    }

    let elapsed = start.elapsed();
    let transactions = config.rounds * 2;
    let report = BenchReport {
        rounds: config.rounds,
        transactions,
        elapsed,
        tx_per_second: transactions as f64 / elapsed.as_secs_f64(),
    };
    info!("{report}");
    Ok(report)
}

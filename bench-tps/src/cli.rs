//! Command-line interface.

use {
    clap::{value_t, App, Arg, ArgMatches},
    std::path::PathBuf,
};

/// Fully parsed harness invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the sidechain daemon binary.
    pub daemon_binary: PathBuf,
    /// Primary node's `key=value` configuration file.
    pub node_conf: PathBuf,
    /// Root under which per-node data directories are created.
    pub datadir_root: PathBuf,
    /// Treat the target as a single-asset (Bitcoin-Core-style) daemon.
    pub single_asset: bool,
    /// Launch the daemon without `-regtest`.
    pub no_regtest: bool,
    /// Produce blocks through the signed-block sequence instead of
    /// `generate`.
    pub signed_blocks: bool,
    /// Give the parties their own node instances; their configuration
    /// files follow.
    pub separate_wallets: bool,
    pub alice_conf: Option<PathBuf>,
    pub bob_conf: Option<PathBuf>,
    pub rounds: u64,
    pub batch_size: u64,
    /// Amount moved per ping-pong leg.
    pub amount: f64,
    /// Starting balance granted to each party.
    pub seed: f64,
    /// Swap price paid to the seller.
    pub transfer: f64,
    pub marketplace_cut: f64,
    pub fee: f64,
}

fn is_parsable<T: std::str::FromStr>(value: String) -> Result<(), String>
where
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map(|_| ())
        .map_err(|e| format!("cannot parse `{value}`: {e}"))
}

pub fn build_args<'a, 'b>(version: &'b str) -> App<'a, 'b> {
    App::new("sidechain-bench-tps")
        .about("End-to-end sidechain daemon benchmark harness")
        .version(version)
        .arg(
            Arg::with_name("daemon")
                .long("daemon")
                .value_name("PATH")
                .takes_value(true)
                .required(true)
                .help("Path to the sidechain daemon binary"),
        )
        .arg(
            Arg::with_name("conf")
                .long("conf")
                .value_name("FILE")
                .takes_value(true)
                .required(true)
                .help("Primary node configuration file (rpcuser/rpcpassword/rpcport)"),
        )
        .arg(
            Arg::with_name("datadir-root")
                .long("datadir-root")
                .value_name("DIR")
                .takes_value(true)
                .default_value("harness-data")
                .help("Directory under which node data directories are created"),
        )
        .arg(
            Arg::with_name("single-asset")
                .long("single-asset")
                .help("Target a single-asset daemon (implicit fees, no asset tags)"),
        )
        .arg(
            Arg::with_name("no-regtest")
                .long("no-regtest")
                .help("Do not pass -regtest to the daemon"),
        )
        .arg(
            Arg::with_name("signed-blocks")
                .long("signed-blocks")
                .help("Advance the chain via getnewblockhex/signblock/submitblock"),
        )
        .arg(
            Arg::with_name("separate-wallets")
                .long("separate-wallets")
                .requires_all(&["alice-conf", "bob-conf"])
                .help("Run each party in its own node instance"),
        )
        .arg(
            Arg::with_name("alice-conf")
                .long("alice-conf")
                .value_name("FILE")
                .takes_value(true)
                .help("Configuration file for the buyer's node (separate-wallets)"),
        )
        .arg(
            Arg::with_name("bob-conf")
                .long("bob-conf")
                .value_name("FILE")
                .takes_value(true)
                .help("Configuration file for the seller's node (separate-wallets)"),
        )
        .arg(
            Arg::with_name("rounds")
                .long("rounds")
                .value_name("NUM")
                .takes_value(true)
                .default_value("100")
                .validator(is_parsable::<u64>)
                .help("Ping-pong rounds to time (two transactions each)"),
        )
        .arg(
            Arg::with_name("batch-size")
                .long("batch-size")
                .value_name("NUM")
                .takes_value(true)
                .default_value("23")
                .validator(is_parsable::<u64>)
                .help("Transactions allowed to share a block; keep under the daemon's mempool ceiling"),
        )
        .arg(
            Arg::with_name("amount")
                .long("amount")
                .value_name("UNITS")
                .takes_value(true)
                .default_value("3")
                .validator(is_parsable::<f64>)
                .help("Amount moved per ping-pong leg"),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .value_name("UNITS")
                .takes_value(true)
                .default_value("1000")
                .validator(is_parsable::<f64>)
                .help("Starting balance granted to each party"),
        )
        .arg(
            Arg::with_name("transfer")
                .long("transfer")
                .value_name("UNITS")
                .takes_value(true)
                .default_value("4")
                .validator(is_parsable::<f64>)
                .help("Swap price paid to the seller"),
        )
        .arg(
            Arg::with_name("marketplace-cut")
                .long("marketplace-cut")
                .value_name("UNITS")
                .takes_value(true)
                .default_value("2")
                .validator(is_parsable::<f64>)
                .help("Marketplace cut of the swap"),
        )
        .arg(
            Arg::with_name("fee")
                .long("fee")
                .value_name("UNITS")
                .takes_value(true)
                .default_value("1")
                .validator(is_parsable::<f64>)
                .help("Flat fee per transaction"),
        )
}

pub fn extract_args(matches: &ArgMatches) -> Config {
    Config {
        daemon_binary: PathBuf::from(matches.value_of("daemon").unwrap()),
        node_conf: PathBuf::from(matches.value_of("conf").unwrap()),
        datadir_root: PathBuf::from(matches.value_of("datadir-root").unwrap()),
        single_asset: matches.is_present("single-asset"),
        no_regtest: matches.is_present("no-regtest"),
        signed_blocks: matches.is_present("signed-blocks"),
        separate_wallets: matches.is_present("separate-wallets"),
        alice_conf: matches.value_of("alice-conf").map(PathBuf::from),
        bob_conf: matches.value_of("bob-conf").map(PathBuf::from),
        rounds: value_t!(matches, "rounds", u64).unwrap_or_else(|e| e.exit()),
        batch_size: value_t!(matches, "batch-size", u64).unwrap_or_else(|e| e.exit()),
        amount: value_t!(matches, "amount", f64).unwrap_or_else(|e| e.exit()),
        seed: value_t!(matches, "seed", f64).unwrap_or_else(|e| e.exit()),
        transfer: value_t!(matches, "transfer", f64).unwrap_or_else(|e| e.exit()),
        marketplace_cut: value_t!(matches, "marketplace-cut", f64).unwrap_or_else(|e| e.exit()),
        fee: value_t!(matches, "fee", f64).unwrap_or_else(|e| e.exit()),
    }
}

use {
    log::{error, info, warn},
    sidechain_bench_tps::{
        bench::{run_ping_pong, Party, PingPongConfig},
        cli::{self, Config},
        config::{prepare_datadir, NodeConfig},
        confirm::ConfirmationDriver,
        daemon::{self, NodeHandle},
        error::{HarnessError, Result},
        profile::{ConfirmMode, TargetProfile},
        scenario::{self, SwapAmounts},
    },
    std::process::exit,
};

/// Regtest daemons cap mempool transactions per block at 25; a larger
/// batch starts getting legs rejected mid-benchmark.
const MEMPOOL_CEILING: u64 = 25;

/// Blocks needed before the first coinbase output matures.
const COINBASE_MATURITY: u64 = 101;

const DAEMON_CONF_NAME: &str = "elements.conf";

fn resolve_profile(config: &Config) -> TargetProfile {
    let confirm_mode = if config.signed_blocks {
        ConfirmMode::SignedBlocks
    } else {
        ConfirmMode::Generate
    };
    if config.single_asset {
        TargetProfile::single_asset(confirm_mode)
    } else {
        TargetProfile::multi_asset(confirm_mode)
    }
}

/// Launch the primary node. In signed-block mode this is a two-phase
/// start: a throwaway run mints the block-signing key, then the real
/// node comes up with the matching `-signblockscript` and re-imports the
/// key.
fn launch_primary(config: &Config, node_conf: &NodeConfig) -> Result<NodeHandle> {
    let regtest = !config.no_regtest;
    if !config.signed_blocks {
        let datadir = prepare_datadir(
            &config.datadir_root,
            "primary",
            &config.node_conf,
            DAEMON_CONF_NAME,
        )?;
        return daemon::start_daemon(&config.daemon_binary, &datadir, node_conf, regtest, &[]);
    }

    let bootstrap_datadir = prepare_datadir(
        &config.datadir_root,
        "signing-key-bootstrap",
        &config.node_conf,
        DAEMON_CONF_NAME,
    )?;
    let key = daemon::bootstrap_signing_key(
        &config.daemon_binary,
        &bootstrap_datadir,
        node_conf,
        regtest,
    )?;

    let datadir = prepare_datadir(
        &config.datadir_root,
        "primary",
        &config.node_conf,
        DAEMON_CONF_NAME,
    )?;
    let node = daemon::start_daemon(
        &config.daemon_binary,
        &datadir,
        node_conf,
        regtest,
        &[format!("-signblockscript={}", key.signblockscript())],
    )?;
    node.client().import_priv_key(&key.privkey_wif)?;
    Ok(node)
}

fn launch_wallet_node(
    config: &Config,
    name: &str,
    conf_path: &std::path::Path,
) -> Result<NodeHandle> {
    let node_conf = NodeConfig::load(conf_path)?;
    let datadir = prepare_datadir(&config.datadir_root, name, conf_path, DAEMON_CONF_NAME)?;
    daemon::start_daemon(
        &config.daemon_binary,
        &datadir,
        &node_conf,
        !config.no_regtest,
        &[],
    )
}

fn run(config: &Config) -> Result<()> {
    if config.batch_size >= MEMPOOL_CEILING {
        warn!(
            "batch size {} meets the daemon's mempool ceiling ({MEMPOOL_CEILING}); \
             expect broadcast rejections",
            config.batch_size
        );
    }

    let node_conf = NodeConfig::load(&config.node_conf)?;
    let primary = launch_primary(config, &node_conf)?;
    let wallet_nodes = match (config.separate_wallets, &config.alice_conf, &config.bob_conf) {
        (true, Some(alice_conf), Some(bob_conf)) => Some((
            launch_wallet_node(config, "alice", alice_conf)?,
            launch_wallet_node(config, "bob", bob_conf)?,
        )),
        (true, _, _) => {
            return Err(HarnessError::Config(
                "--separate-wallets needs --alice-conf and --bob-conf".to_string(),
            ))
        }
        (false, _, _) => None,
    };

    let profile = resolve_profile(config);
    let driver = ConfirmationDriver::new(primary.client(), &profile);
    driver.advance_chain(COINBASE_MATURITY)?;

    let participants = scenario::setup_participants(
        &driver,
        wallet_nodes
            .as_ref()
            .map(|(alice, bob)| (alice.client(), bob.client())),
    )?;

    let amounts = SwapAmounts {
        seed: config.seed,
        transfer: config.transfer,
        marketplace_cut: config.marketplace_cut,
        fee: config.fee,
    };
    scenario::seed(&driver, &participants.alice, amounts.seed)?;
    scenario::seed(&driver, &participants.bob, amounts.seed)?;

    let certificate = if config.single_asset {
        None
    } else {
        Some(scenario::issue_certificate(&driver, &participants)?)
    };
    scenario::atomic_swap(&driver, &participants, &amounts, certificate.as_deref())?;
    scenario::verify_swap(&driver, &participants, &amounts, certificate.as_deref())?;
    driver.advance_chain(1)?;

    let mut alice = Party::new(
        "alice",
        participants.alice.clone(),
        participants.alice_wallet,
        amounts.buyer_change(),
    );
    let mut bob = Party::new(
        "bob",
        participants.bob.clone(),
        participants.bob_wallet,
        amounts.seed + amounts.transfer,
    );
    let report = run_ping_pong(
        &driver,
        &mut alice,
        &mut bob,
        &PingPongConfig {
            rounds: config.rounds,
            batch_size: config.batch_size,
            amount: config.amount,
            fee: config.fee,
        },
    )?;
    println!("{report}");

    if let Some((alice_node, bob_node)) = wallet_nodes {
        alice_node.stop()?;
        bob_node.stop()?;
    }
    primary.stop()?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = cli::build_args(env!("CARGO_PKG_VERSION")).get_matches();
    let config = cli::extract_args(&matches);
    info!("target: {}", config.daemon_binary.display());

    if let Err(e) = run(&config) {
        error!("{e}");
        exit(1);
    }
}

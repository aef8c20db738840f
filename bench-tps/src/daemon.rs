//! Sidechain daemon supervision.
//!
//! Spawns daemon processes against throwaway datadirs, polls the RPC
//! port until the node answers instead of sleeping a fixed interval, and
//! shuts nodes down through the `stop` RPC so wallets flush cleanly.

use {
    crate::{
        config::NodeConfig,
        error::{HarnessError, Result},
    },
    log::{debug, info, warn},
    sidechain_rpc_client::RpcClient,
    std::{
        path::{Path, PathBuf},
        process::{Child, Command, Stdio},
        thread::sleep,
        time::{Duration, Instant},
    },
};

const READY_TIMEOUT: Duration = Duration::from_secs(30);
const READY_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// A running daemon plus the client connected to it. Dropping the handle
/// without calling [`NodeHandle::stop`] kills the process outright.
#[derive(Debug)]
pub struct NodeHandle {
    child: Child,
    client: RpcClient,
    datadir: PathBuf,
}

impl NodeHandle {
    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    pub fn datadir(&self) -> &Path {
        &self.datadir
    }

    /// Ask the node to shut down and wait for the process to exit.
    pub fn stop(mut self) -> Result<()> {
        self.client.stop()?;
        let status = self
            .child
            .wait()
            .map_err(|e| HarnessError::Daemon(format!("wait for daemon: {e}")))?;
        debug!("daemon exited with {status}");
        Ok(())
    }
}

impl Drop for NodeHandle {
    fn drop(&mut self) {
        match self.child.try_wait() {
            Ok(Some(_)) => (),
            _ => {
                warn!("daemon still running at teardown, killing");
                let _ = self.child.kill();
                let _ = self.child.wait();
            }
        }
    }
}

/// Launch a daemon against `datadir` and block until it answers
/// `getblockcount`. `extra_args` is for chain-specific flags such as
/// `-signblockscript=...`.
pub fn start_daemon(
    binary: &Path,
    datadir: &Path,
    config: &NodeConfig,
    regtest: bool,
    extra_args: &[String],
) -> Result<NodeHandle> {
    start_daemon_with_timeout(binary, datadir, config, regtest, extra_args, READY_TIMEOUT)
}

fn start_daemon_with_timeout(
    binary: &Path,
    datadir: &Path,
    config: &NodeConfig,
    regtest: bool,
    extra_args: &[String],
    ready_timeout: Duration,
) -> Result<NodeHandle> {
    let mut command = Command::new(binary);
    command.arg(format!("-datadir={}", datadir.display()));
    if regtest {
        command.arg("-regtest");
    }
    command
        .args(extra_args)
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    debug!("spawning {command:?}");
    let mut child = command.spawn().map_err(|e| {
        HarnessError::Daemon(format!("cannot spawn {}: {e}", binary.display()))
    })?;

    let client = match RpcClient::new(&config.rpc_url()) {
        Ok(client) => client,
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e.into());
        }
    };
    // The handle owns the child from here on, so a node that never
    // answers is killed by the handle's teardown instead of leaking.
    let node = NodeHandle {
        child,
        client,
        datadir: datadir.to_path_buf(),
    };
    wait_for_ready(node.client(), ready_timeout)?;
    info!("daemon ready at port {}", config.rpcport);
    Ok(node)
}

fn wait_for_ready(client: &RpcClient, ready_timeout: Duration) -> Result<()> {
    let deadline = Instant::now() + ready_timeout;
    loop {
        match client.get_block_count() {
            Ok(height) => {
                debug!("node up at height {height}");
                return Ok(());
            }
            Err(e) if Instant::now() >= deadline => {
                return Err(HarnessError::Daemon(format!(
                    "node not ready after {ready_timeout:?}: {e}"
                )));
            }
            Err(_) => sleep(READY_POLL_INTERVAL),
        }
    }
}

/// A block-signing key harvested from a throwaway node run.
#[derive(Debug, Clone)]
pub struct BlockSigningKey {
    pub pubkey: String,
    pub privkey_wif: String,
}

impl BlockSigningKey {
    /// The 1-of-1 multisig block-signing script the daemon is restarted
    /// with: `OP_1 <pubkey> OP_1 OP_CHECKMULTISIG`.
    pub fn signblockscript(&self) -> String {
        format!("5121{}51ae", self.pubkey)
    }
}

/// Boot a throwaway daemon just long enough to mint a block-signing
/// keypair, then shut it down. The caller restarts the real node with
/// [`BlockSigningKey::signblockscript`] and re-imports the private key.
pub fn bootstrap_signing_key(
    binary: &Path,
    datadir: &Path,
    config: &NodeConfig,
    regtest: bool,
) -> Result<BlockSigningKey> {
    let node = start_daemon(binary, datadir, config, regtest, &[])?;
    let address = node.client().get_new_address()?;
    let validated = node.client().validate_address(&address)?;
    let pubkey = validated.pubkey.ok_or_else(|| {
        HarnessError::Daemon(format!("no pubkey for fresh address {address}"))
    })?;
    let privkey_wif = node.client().dump_priv_key(&address)?;
    node.stop()?;
    info!("block-signing pubkey {pubkey}");
    Ok(BlockSigningKey {
        pubkey,
        privkey_wif,
    })
}

//! In-process mock sidechain daemon.
//!
//! One shared [`MockChain`] holds the UTXO set; each wallet gets its own
//! JSON-RPC HTTP endpoint bound to an owner name, so multi-wallet signing
//! flows exercise the same wire path as a real node cluster. The chain
//! tracks ownership per address and refuses broadcasts that are missing a
//! required signature or that do not balance per asset, which is the
//! behavior the harness's error paths depend on.

#![allow(dead_code)]

use {
    jsonrpc_core::{Compatibility, Error as RpcServerError, ErrorCode, IoHandler, Params, Value},
    jsonrpc_http_server::{Server, ServerBuilder},
    serde_json::json,
    std::{
        collections::{HashMap, HashSet},
        sync::{Arc, Mutex},
    },
};

pub const NATIVE_ASSET: &str = "bitcoin";

/// Flat fee the mock wallet attaches when funding a transaction itself.
const FUND_FEE: f64 = 1.0;
const EPSILON: f64 = 1e-8;

#[derive(Debug, Clone)]
struct Utxo {
    txid: String,
    vout: u32,
    address: String,
    amount: f64,
    asset: String,
}

#[derive(Debug, Clone)]
struct TxOut {
    dest: String,
    amount: f64,
    asset: String,
}

#[derive(Debug, Clone, Default)]
struct PendingTx {
    inputs: Vec<(String, u32)>,
    outputs: Vec<TxOut>,
    fee: Option<f64>,
    data: Option<String>,
    signed_by: HashSet<String>,
}

pub struct MockChain {
    height: u64,
    counter: u64,
    utxos: Vec<Utxo>,
    /// address -> wallet owner name
    owners: HashMap<String, String>,
    locked: HashSet<(String, u32)>,
    /// raw blob id -> transaction under construction
    raw: HashMap<String, PendingTx>,
    /// txid -> value-bearing outputs, for `getrawtransaction`
    decoded: HashMap<String, Vec<TxOut>>,
    mempool: Vec<String>,
    pub blocks_mined: u64,
    /// Payloads of every `"data"` output broadcast so far.
    pub embedded_data: Vec<String>,
}

impl MockChain {
    /// Fresh chain with one large native-asset output owned by `owner`,
    /// standing in for matured coinbase funds.
    pub fn with_bank(owner: &str, amount: f64) -> Arc<Mutex<Self>> {
        let mut chain = Self {
            height: 0,
            counter: 0,
            utxos: Vec::new(),
            owners: HashMap::new(),
            locked: HashSet::new(),
            raw: HashMap::new(),
            decoded: HashMap::new(),
            mempool: Vec::new(),
            blocks_mined: 0,
            embedded_data: Vec::new(),
        };
        let bank = format!("{owner}-bank");
        chain.owners.insert(bank.clone(), owner.to_string());
        let txid = chain.next_id("tx");
        chain.decoded.insert(
            txid.clone(),
            vec![TxOut {
                dest: bank.clone(),
                amount,
                asset: NATIVE_ASSET.to_string(),
            }],
        );
        chain.utxos.push(Utxo {
            txid,
            vout: 0,
            address: bank,
            amount,
            asset: NATIVE_ASSET.to_string(),
        });
        Arc::new(Mutex::new(chain))
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn mempool_len(&self) -> usize {
        self.mempool.len()
    }

    pub fn locked_len(&self) -> usize {
        self.locked.len()
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{prefix}{:04}", self.counter)
    }

    fn new_address(&mut self, owner: &str) -> String {
        let address = format!("{owner}-addr{}", self.counter + 1);
        self.counter += 1;
        // Register both the confidential form and the unblinded form the
        // harness derives through validateaddress.
        self.owners.insert(address.clone(), owner.to_string());
        self.owners
            .insert(format!("u-{address}"), owner.to_string());
        address
    }

    fn owner_of(&self, address: &str) -> Option<&str> {
        self.owners.get(address).map(String::as_str)
    }

    fn find_utxo(&self, txid: &str, vout: u32) -> Option<&Utxo> {
        self.utxos
            .iter()
            .find(|u| u.txid == txid && u.vout == vout)
    }

    /// Wallet-owned spendable outputs of `asset`, largest first so the
    /// bank output gets picked before party balances are raided.
    fn select_owned(&self, owner: &str, asset: &str, needed: f64) -> Option<Vec<(String, u32)>> {
        let mut candidates: Vec<&Utxo> = self
            .utxos
            .iter()
            .filter(|u| {
                u.asset == asset
                    && !self.locked.contains(&(u.txid.clone(), u.vout))
                    && self.owner_of(&u.address) == Some(owner)
            })
            .collect();
        candidates.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        let mut selected = Vec::new();
        let mut total = 0.0;
        for utxo in candidates {
            selected.push((utxo.txid.clone(), utxo.vout));
            total += utxo.amount;
            if total >= needed - EPSILON {
                return Some(selected);
            }
        }
        None
    }

    fn create_raw(
        &mut self,
        inputs: Vec<(String, u32)>,
        outputs: &serde_json::Map<String, Value>,
        assets: Option<&serde_json::Map<String, Value>>,
    ) -> String {
        let mut tx = PendingTx {
            inputs,
            ..PendingTx::default()
        };
        for (dest, value) in outputs {
            match dest.as_str() {
                "fee" => tx.fee = value.as_f64(),
                "data" => tx.data = value.as_str().map(str::to_string),
                _ => {
                    let asset = assets
                        .and_then(|m| m.get(dest))
                        .and_then(Value::as_str)
                        .unwrap_or(NATIVE_ASSET);
                    tx.outputs.push(TxOut {
                        dest: dest.clone(),
                        amount: value.as_f64().unwrap_or(0.0),
                        asset: asset.to_string(),
                    });
                }
            }
        }
        let id = self.next_id("raw");
        self.raw.insert(id.clone(), tx);
        id
    }

    fn fund_raw(&mut self, blob: &str, owner: &str) -> Result<String, RpcServerError> {
        let tx = self
            .raw
            .get(blob)
            .cloned()
            .ok_or_else(|| node_err(-22, "unknown raw transaction"))?;
        let outflow: f64 = tx
            .outputs
            .iter()
            .filter(|o| o.asset == NATIVE_ASSET)
            .map(|o| o.amount)
            .sum();
        let needed = outflow + FUND_FEE;
        let selected = self
            .select_owned(owner, NATIVE_ASSET, needed)
            .ok_or_else(|| node_err(-4, "insufficient funds"))?;
        let inflow: f64 = selected
            .iter()
            .filter_map(|(txid, vout)| self.find_utxo(txid, *vout))
            .map(|u| u.amount)
            .sum();

        let mut funded = tx;
        funded.inputs.extend(selected);
        let change = inflow - needed;
        if change > EPSILON {
            let change_address = self.new_address(owner);
            funded.outputs.push(TxOut {
                dest: change_address,
                amount: change,
                asset: NATIVE_ASSET.to_string(),
            });
        }
        funded.fee = Some(FUND_FEE);
        let id = self.next_id("raw");
        self.raw.insert(id.clone(), funded);
        Ok(id)
    }

    fn sign_raw(&mut self, blob: &str, owner: &str) -> Result<(String, bool), RpcServerError> {
        let owners: Vec<Option<String>> = {
            let tx = self
                .raw
                .get(blob)
                .ok_or_else(|| node_err(-22, "unknown raw transaction"))?;
            tx.inputs
                .iter()
                .map(|(txid, vout)| {
                    self.find_utxo(txid, *vout)
                        .and_then(|u| self.owner_of(&u.address))
                        .map(str::to_string)
                })
                .collect()
        };
        let tx = self
            .raw
            .get_mut(blob)
            .ok_or_else(|| node_err(-22, "unknown raw transaction"))?;
        tx.signed_by.insert(owner.to_string());
        let complete = owners
            .iter()
            .all(|o| matches!(o, Some(name) if tx.signed_by.contains(name)));
        Ok((blob.to_string(), complete))
    }

    fn broadcast(&mut self, blob: &str) -> Result<String, RpcServerError> {
        let tx = self
            .raw
            .get(blob)
            .cloned()
            .ok_or_else(|| node_err(-22, "unknown raw transaction"))?;

        let mut inflow: HashMap<String, f64> = HashMap::new();
        for (txid, vout) in &tx.inputs {
            let utxo = self
                .find_utxo(txid, *vout)
                .ok_or_else(|| node_err(-25, "bad-txns-inputs-missingorspent"))?;
            let owner = self
                .owner_of(&utxo.address)
                .ok_or_else(|| node_err(-25, "input from unknown address"))?;
            if !tx.signed_by.contains(owner) {
                return Err(node_err(-26, "non-mandatory-script-verify-flag"));
            }
            *inflow.entry(utxo.asset.clone()).or_default() += utxo.amount;
        }

        let mut outflow: HashMap<String, f64> = HashMap::new();
        for out in &tx.outputs {
            *outflow.entry(out.asset.clone()).or_default() += out.amount;
        }
        for (asset, out_total) in &outflow {
            let in_total = inflow.get(asset).copied().unwrap_or(0.0);
            let spent = if asset == NATIVE_ASSET {
                out_total + tx.fee.unwrap_or(0.0)
            } else {
                *out_total
            };
            if in_total < spent - EPSILON {
                return Err(node_err(-26, "bad-txns-in-belowout"));
            }
            // With an explicit fee every asset must balance exactly.
            if tx.fee.is_some() && in_total > spent + EPSILON {
                return Err(node_err(-26, "bad-txns-fee-out-of-range"));
            }
        }

        for (txid, vout) in &tx.inputs {
            self.utxos.retain(|u| !(u.txid == *txid && u.vout == *vout));
        }
        let txid = self.next_id("tx");
        for (n, out) in tx.outputs.iter().enumerate() {
            self.utxos.push(Utxo {
                txid: txid.clone(),
                vout: n as u32,
                address: out.dest.clone(),
                amount: out.amount,
                asset: out.asset.clone(),
            });
        }
        if let Some(data) = &tx.data {
            self.embedded_data.push(data.clone());
        }
        self.decoded.insert(txid.clone(), tx.outputs.clone());
        self.mempool.push(txid.clone());
        self.raw.remove(blob);
        Ok(txid)
    }

    fn list_unspent(&self, addresses: &[String], asset: Option<&str>) -> Vec<Value> {
        self.utxos
            .iter()
            .filter(|u| addresses.is_empty() || addresses.contains(&u.address))
            .filter(|u| asset.map_or(true, |a| u.asset == a))
            .map(|u| {
                json!({
                    "txid": u.txid,
                    "vout": u.vout,
                    "address": u.address,
                    "amount": u.amount,
                    "asset": u.asset,
                    "scriptPubKey": script_for(&u.address),
                    "confirmations": 0,
                })
            })
            .collect()
    }

    fn confirm_blocks(&mut self, n: u64) -> Vec<String> {
        self.mempool.clear();
        self.height += n;
        self.blocks_mined += n;
        (0..n).map(|i| format!("block{}", self.height - n + i + 1)).collect()
    }

    fn issue_asset(&mut self, amount: f64, owner: &str) -> (String, String) {
        let asset = self.next_id("asset");
        let issuance_address = format!("{owner}-issuance-{asset}");
        self.owners
            .insert(issuance_address.clone(), owner.to_string());
        let txid = self.next_id("tx");
        let out = TxOut {
            dest: issuance_address.clone(),
            amount,
            asset: asset.clone(),
        };
        self.decoded.insert(txid.clone(), vec![out]);
        self.utxos.push(Utxo {
            txid: txid.clone(),
            vout: 0,
            address: issuance_address,
            amount,
            asset: asset.clone(),
        });
        self.mempool.push(txid.clone());
        (asset, txid)
    }

    fn send_to_address(
        &mut self,
        dest: &str,
        amount: f64,
        asset: &str,
        owner: &str,
    ) -> Result<String, RpcServerError> {
        let selected = self
            .select_owned(owner, asset, amount)
            .ok_or_else(|| node_err(-4, "insufficient funds"))?;
        let inflow: f64 = selected
            .iter()
            .filter_map(|(txid, vout)| self.find_utxo(txid, *vout))
            .map(|u| u.amount)
            .sum();
        for (txid, vout) in &selected {
            self.utxos.retain(|u| !(u.txid == *txid && u.vout == *vout));
        }

        let txid = self.next_id("tx");
        let mut outs = vec![TxOut {
            dest: dest.to_string(),
            amount,
            asset: asset.to_string(),
        }];
        let change = inflow - amount;
        if change > EPSILON {
            let change_address = self.new_address(owner);
            outs.push(TxOut {
                dest: change_address,
                amount: change,
                asset: asset.to_string(),
            });
        }
        for (n, out) in outs.iter().enumerate() {
            self.utxos.push(Utxo {
                txid: txid.clone(),
                vout: n as u32,
                address: out.dest.clone(),
                amount: out.amount,
                asset: out.asset.clone(),
            });
        }
        self.decoded.insert(txid.clone(), outs);
        self.mempool.push(txid.clone());
        Ok(txid)
    }
}

fn script_for(address: &str) -> String {
    format!("spk-{address}")
}

fn node_err(code: i64, message: &str) -> RpcServerError {
    RpcServerError {
        code: ErrorCode::ServerError(code),
        message: message.to_string(),
        data: None,
    }
}

fn parse_inputs(value: &Value) -> Vec<(String, u32)> {
    value
        .as_array()
        .map(|inputs| {
            inputs
                .iter()
                .filter_map(|input| {
                    Some((
                        input.get("txid")?.as_str()?.to_string(),
                        input.get("vout")?.as_u64()? as u32,
                    ))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Spawn one wallet endpoint over the shared chain. The returned server
/// must stay alive for the duration of the test.
pub fn spawn_wallet(chain: &Arc<Mutex<MockChain>>, owner: &str) -> (Server, String) {
    let mut io = IoHandler::with_compatibility(Compatibility::Both);
    let owner = owner.to_string();

    macro_rules! method {
        ($name:expr, |$chain:ident, $owner:ident, $args:ident| $body:expr) => {{
            let shared = chain.clone();
            let wallet = owner.clone();
            io.add_sync_method($name, move |params: Params| {
                let $args: Vec<Value> = params.parse()?;
                let mut $chain = shared.lock().unwrap();
                let $owner = wallet.as_str();
                // Not every handler touches all three bindings.
                let _ = (&$args, $owner, &mut *$chain);
                $body
            });
        }};
    }

    method!("getnewaddress", |chain, owner, args| Ok(Value::String(
        chain.new_address(owner)
    )));
    method!("validateaddress", |chain, owner, args| {
        let address = args[0].as_str().unwrap_or_default();
        Ok(json!({
            "isvalid": true,
            "pubkey": format!("02{address:>064}").replace(' ', "0"),
            "unconfidential": format!("u-{address}"),
        }))
    });
    method!("dumpprivkey", |chain, owner, args| Ok(Value::String(
        format!("wif-{}", args[0].as_str().unwrap_or_default())
    )));
    method!("importprivkey", |chain, owner, args| Ok(Value::Null));
    method!("importaddress", |chain, owner, args| Ok(Value::Null));

    method!("listunspent", |chain, owner, args| {
        let addresses: Vec<String> = args
            .get(2)
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let asset = args.get(4).and_then(Value::as_str);
        Ok(Value::Array(chain.list_unspent(&addresses, asset)))
    });
    method!("lockunspent", |chain, owner, args| {
        let unlock = args[0].as_bool().unwrap_or(false);
        for (txid, vout) in parse_inputs(&args[1]) {
            if unlock {
                chain.locked.remove(&(txid, vout));
            } else {
                chain.locked.insert((txid, vout));
            }
        }
        Ok(Value::Bool(true))
    });

    method!("createrawtransaction", |chain, owner, args| {
        let inputs = parse_inputs(&args[0]);
        let outputs = args[1]
            .as_object()
            .ok_or_else(|| node_err(-22, "outputs must be an object"))?;
        let assets = args.get(3).and_then(Value::as_object);
        Ok(Value::String(chain.create_raw(inputs, outputs, assets)))
    });
    method!("fundrawtransaction", |chain, owner, args| {
        let blob = args[0].as_str().unwrap_or_default();
        let funded = chain.fund_raw(blob, owner)?;
        Ok(json!({ "hex": funded, "fee": FUND_FEE, "changepos": 1 }))
    });
    method!("signrawtransaction", |chain, owner, args| {
        let blob = args[0].as_str().unwrap_or_default();
        let (hex, complete) = chain.sign_raw(blob, owner)?;
        Ok(json!({ "hex": hex, "complete": complete }))
    });
    method!("sendrawtransaction", |chain, owner, args| {
        let blob = args[0].as_str().unwrap_or_default();
        Ok(Value::String(chain.broadcast(blob)?))
    });
    method!("getrawtransaction", |chain, owner, args| {
        let txid = args[0].as_str().unwrap_or_default();
        let outs = chain
            .decoded
            .get(txid)
            .ok_or_else(|| node_err(-5, "No such transaction"))?;
        let vout: Vec<Value> = outs
            .iter()
            .enumerate()
            .map(|(n, out)| {
                json!({
                    "n": n,
                    "value": out.amount,
                    "scriptPubKey": { "hex": script_for(&out.dest), "type": "scripthash" },
                })
            })
            .collect();
        Ok(json!({ "txid": txid, "vout": vout }))
    });

    method!("issueasset", |chain, owner, args| {
        let amount = args[0].as_f64().unwrap_or(0.0);
        let (asset, txid) = chain.issue_asset(amount, owner);
        Ok(json!({ "asset": asset, "token": format!("token-{asset}"), "txid": txid }))
    });
    method!("sendtoaddress", |chain, owner, args| {
        let dest = args[0].as_str().unwrap_or_default();
        let amount = args[1].as_f64().unwrap_or(0.0);
        let asset = args.get(5).and_then(Value::as_str).unwrap_or(NATIVE_ASSET);
        Ok(Value::String(chain.send_to_address(
            dest, amount, asset, owner,
        )?))
    });

    method!("generate", |chain, owner, args| {
        let n = args[0].as_u64().unwrap_or(0);
        let hashes = chain.confirm_blocks(n);
        Ok(json!(hashes))
    });
    method!("getblockcount", |chain, owner, args| Ok(json!(
        chain.height()
    )));
    method!("getnewblockhex", |chain, owner, args| Ok(Value::String(
        format!("template-{}", chain.height() + 1)
    )));
    method!("signblock", |chain, owner, args| Ok(json!(format!(
        "sig-{owner}-{}",
        args[0].as_str().unwrap_or_default()
    ))));
    method!("combineblocksigs", |chain, owner, args| {
        let template = args[0].as_str().unwrap_or_default();
        Ok(json!({ "hex": format!("{template}-signed"), "complete": true }))
    });
    method!("submitblock", |chain, owner, args| {
        let block = args[0].as_str().unwrap_or_default();
        if !block.ends_with("-signed") {
            // Non-null verdict string, the daemons' rejection convention.
            return Ok(Value::String("bad-witness".to_string()));
        }
        chain.confirm_blocks(1);
        Ok(Value::Null)
    });
    method!("stop", |chain, owner, args| Ok(Value::String(
        "stopping".to_string()
    )));

    let server = ServerBuilder::new(io)
        .start_http(&"127.0.0.1:0".parse().unwrap())
        .expect("start mock wallet server");
    let url = format!("http://harness:secret@{}", server.address());
    (server, url)
}

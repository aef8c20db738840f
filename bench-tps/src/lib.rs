//! End-to-end benchmark harness for sidechain daemons.
//!
//! Drives a daemon through its JSON-RPC interface: seeds parties, stages
//! a two-signer atomic asset swap, then times a ping-pong transfer loop
//! to measure raw-transaction throughput. Everything is synchronous and
//! every failure is fatal; the harness asserts the node works, it does
//! not tolerate it half-working.

pub mod bench;
pub mod cli;
pub mod compose;
pub mod config;
pub mod confirm;
pub mod daemon;
pub mod error;
pub mod profile;
pub mod scenario;
pub mod sign;

pub use crate::{
    bench::{run_ping_pong, BenchReport, BlockBatcher, Party, PingPongConfig},
    compose::{compose, transact, OutputSet},
    confirm::ConfirmationDriver,
    error::{HarnessError, Result},
    profile::{ConfirmMode, FeeModel, TargetProfile},
    scenario::{Participants, SwapAmounts},
    sign::{sign_all, Signer},
};

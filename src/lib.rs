//! A single-node proof-of-work ledger.
//!
//! Miners fetch the last block, search offline for a proof whose hash
//! together with that block's canonical string has enough leading zeroes, and
//! submit it. A valid proof forges the next block; anything else leaves the
//! ledger untouched.

pub mod api;
pub mod blockchain;
pub mod config;

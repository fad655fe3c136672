// Blockchain module
//
// This module contains the core ledger implementation including:
// - Block structure and its canonical string
// - Block hashing
// - Proof of work validation
// - The append-only ledger
// - Proof submission (mining)

pub mod block;
pub mod chain;
pub mod crypto;
pub mod mining;
pub mod pow;

// Re-export main components for easier access
pub use block::{Block, GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
pub use chain::{verify_chain, BlockchainError, Ledger};
pub use crypto::hash_block;
pub use mining::{submit_proof, MiningOutcome};
pub use pow::{proof_of_work, valid_proof, DIFFICULTY};

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{error, info};
use serde_json::Value;
use thiserror::Error;

use super::block::{Block, GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
use super::crypto::hash_block;
use super::pow::valid_proof;

/// Errors that can occur during ledger operations
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("Ledger invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Invalid chain: {0}")]
    InvalidChain(String),

    #[error("Ledger lock poisoned by a panicked writer")]
    LockPoisoned,
}

/// Blocks and the transactions waiting for the next block
#[derive(Debug)]
struct LedgerState {
    chain: Vec<Block>,
    pending_transactions: Vec<Value>,
}

/// The append-only, in-memory ledger.
///
/// Readers share a read lock and get owned snapshots. All writes go through
/// an append session, which holds the write lock for its whole lifetime so
/// a read of the tip and the append that follows it cannot interleave with
/// another writer.
#[derive(Debug)]
pub struct Ledger {
    state: RwLock<LedgerState>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Creates a new ledger holding only the genesis block
    pub fn new() -> Self {
        let genesis = Block::genesis();
        info!("Created genesis block at {}", genesis.timestamp);

        Ledger {
            state: RwLock::new(LedgerState {
                chain: vec![genesis],
                pending_transactions: Vec::new(),
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LedgerState>, BlockchainError> {
        self.state.read().map_err(|_| BlockchainError::LockPoisoned)
    }

    /// Gets a snapshot of the entire chain
    pub fn chain(&self) -> Result<Vec<Block>, BlockchainError> {
        Ok(self.read()?.chain.clone())
    }

    /// Gets the last block in the chain
    pub fn last_block(&self) -> Result<Block, BlockchainError> {
        let state = self.read()?;
        tip(&state.chain).cloned()
    }

    /// Number of blocks in the chain
    pub fn len(&self) -> Result<usize, BlockchainError> {
        Ok(self.read()?.chain.len())
    }

    /// Whether the chain has no blocks; never true once the genesis block exists
    pub fn is_empty(&self) -> Result<bool, BlockchainError> {
        Ok(self.read()?.chain.is_empty())
    }

    /// Gets the transactions queued for the next block
    pub fn pending_transactions(&self) -> Result<Vec<Value>, BlockchainError> {
        Ok(self.read()?.pending_transactions.clone())
    }

    /// Checks the current chain against every ledger invariant
    pub fn is_valid(&self) -> Result<bool, BlockchainError> {
        let state = self.read()?;

        match verify_chain(&state.chain) {
            Ok(()) => Ok(true),
            Err(err) => {
                error!("{}", err);
                Ok(false)
            }
        }
    }

    /// Takes the exclusive write lock and opens an append session
    pub(crate) fn begin_append(&self) -> Result<AppendSession<'_>, BlockchainError> {
        let state = self.state.write().map_err(|_| BlockchainError::LockPoisoned)?;
        Ok(AppendSession { state })
    }
}

/// Exclusive access to the ledger for one read-validate-append sequence
pub(crate) struct AppendSession<'a> {
    state: RwLockWriteGuard<'a, LedgerState>,
}

impl AppendSession<'_> {
    /// The current tip as seen under the write lock
    pub(crate) fn last_block(&self) -> Result<&Block, BlockchainError> {
        tip(&self.state.chain)
    }

    /// Forges a new block on top of the current tip.
    ///
    /// The pending transactions move into the block and the buffer is left
    /// empty. `previous_hash` must be the hash of the current tip and `proof`
    /// must solve the puzzle for it.
    ///
    /// # Arguments
    ///
    /// * `proof` - The accepted proof of work
    /// * `previous_hash` - The hash of the current tip
    ///
    /// # Returns
    ///
    /// A copy of the appended block
    pub(crate) fn forge_block(&mut self, proof: i64, previous_hash: String) -> Result<Block, BlockchainError> {
        let last_block = self.last_block()?;
        let expected_hash = hash_block(last_block);
        if previous_hash != expected_hash {
            return Err(BlockchainError::InvariantViolation(format!(
                "previous hash {} does not match tip {} hash {}",
                previous_hash, last_block.index, expected_hash
            )));
        }

        if !valid_proof(&last_block.canonical_string(), proof) {
            return Err(BlockchainError::InvariantViolation(format!(
                "proof {} does not solve tip {}",
                proof, last_block.index
            )));
        }

        let index = self.state.chain.len() as u64 + 1;
        if last_block.index + 1 != index {
            return Err(BlockchainError::InvariantViolation(format!(
                "tip index {} does not match chain length {}",
                last_block.index,
                index - 1
            )));
        }

        let transactions = std::mem::take(&mut self.state.pending_transactions);
        let block = Block::new(index, transactions, proof, previous_hash);

        self.state.chain.push(block.clone());

        Ok(block)
    }
}

fn tip(chain: &[Block]) -> Result<&Block, BlockchainError> {
    chain
        .last()
        .ok_or_else(|| BlockchainError::InvariantViolation("chain has no genesis block".to_string()))
}

/// Verifies a sequence of blocks against the ledger invariants:
/// genesis shape, 1-based indices, hash linkage and proof of work.
pub fn verify_chain(chain: &[Block]) -> Result<(), BlockchainError> {
    let genesis = chain
        .first()
        .ok_or_else(|| BlockchainError::InvalidChain("chain is empty".to_string()))?;

    if genesis.proof != GENESIS_PROOF || genesis.previous_hash != GENESIS_PREVIOUS_HASH {
        return Err(BlockchainError::InvalidChain(
            "first block is not a genesis block".to_string(),
        ));
    }

    for (position, block) in chain.iter().enumerate() {
        if block.index != position as u64 + 1 {
            return Err(BlockchainError::InvalidChain(format!(
                "block at position {} has index {}",
                position, block.index
            )));
        }
    }

    for pair in chain.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);

        if current.previous_hash != hash_block(previous) {
            return Err(BlockchainError::InvalidChain(format!(
                "block {} is not linked to block {}",
                current.index, previous.index
            )));
        }

        if !valid_proof(&previous.canonical_string(), current.proof) {
            return Err(BlockchainError::InvalidChain(format!(
                "block {} carries an invalid proof {}",
                current.index, current.proof
            )));
        }
    }

    Ok(())
}

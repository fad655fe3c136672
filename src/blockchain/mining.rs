use log::{debug, error, info};

use super::block::Block;
use super::chain::{BlockchainError, Ledger};
use super::crypto::hash_block;
use super::pow::valid_proof;

/// Result of a proof submission
#[derive(Debug, Clone, PartialEq)]
pub enum MiningOutcome {
    /// The proof was valid and this block was appended
    Forged(Block),

    /// The proof does not solve the puzzle for the current tip
    Rejected,
}

/// Validates a miner's proof against the current tip and, if it holds,
/// forges the next block.
///
/// The whole read-validate-append sequence runs under the ledger's write
/// lock. A proof that was valid for an earlier tip is checked against the
/// new tip and rejected, so replays never produce a second block.
///
/// # Arguments
///
/// * `ledger` - The ledger to extend
/// * `candidate_proof` - The proof found by the miner
///
/// # Returns
///
/// The forged block or a rejection. Errors only signal a broken invariant.
pub fn submit_proof(ledger: &Ledger, candidate_proof: i64) -> Result<MiningOutcome, BlockchainError> {
    let mut session = ledger.begin_append()?;

    let last_block = session.last_block()?;
    let last_block_string = last_block.canonical_string();

    if !valid_proof(&last_block_string, candidate_proof) {
        debug!(
            "Rejected proof {} against block {}",
            candidate_proof, last_block.index
        );
        return Ok(MiningOutcome::Rejected);
    }

    let previous_hash = hash_block(last_block);

    match session.forge_block(candidate_proof, previous_hash) {
        Ok(block) => {
            info!("Forged block {} with proof {}", block.index, block.proof);
            Ok(MiningOutcome::Forged(block))
        }
        Err(err) => {
            error!("Failed to forge block for proof {}: {}", candidate_proof, err);
            Err(err)
        }
    }
}

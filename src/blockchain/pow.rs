use super::crypto::sha256_hex;

/// Number of leading `'0'` hex characters a valid proof hash must have
pub const DIFFICULTY: usize = 3;

/// Checks a proof against the canonical string of the previous block.
///
/// The guess is `block_string` followed by the decimal form of `proof`; the
/// proof is valid when the SHA-256 hex of the guess starts with
/// [`DIFFICULTY`] zeroes.
pub fn valid_proof(block_string: &str, proof: i64) -> bool {
    let guess = format!("{}{}", block_string, proof);
    let guess_hash = sha256_hex(guess.as_bytes());

    guess_hash.bytes().take(DIFFICULTY).all(|b| b == b'0')
}

/// Searches for the smallest proof accepted by [`valid_proof`].
///
/// This is the miner's side of the puzzle; the ledger never runs it.
pub fn proof_of_work(block_string: &str) -> i64 {
    let mut proof = 0;

    while !valid_proof(block_string, proof) {
        proof += 1;
    }

    proof
}

use crate::*;
use digest::Digest;
use sha2::Sha256;
use std::fmt;

/// `previous_hash` of the first block in a chain.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// One block of the chain, wrapping exactly one transaction. Blocks are
/// created once and never mutated; the chain grows by appending only.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Lowercase hex SHA-256 over `previous_hash || timestamp || transaction`.
    pub hash: String,
    pub previous_hash: String,
    pub transaction: Transaction,

    /// Milliseconds since the Unix epoch at append time.
    pub timestamp: u64,
}

impl Block {
    pub fn new(transaction: Transaction, previous_hash: String, timestamp: u64) -> Self {
        let hash = Block::compute_hash(&previous_hash, timestamp, &transaction);
        Block {
            hash,
            previous_hash,
            transaction,
            timestamp,
        }
    }

    pub fn compute_hash(previous_hash: &str, timestamp: u64, transaction: &Transaction) -> String {
        let mut hasher = Sha256::new();
        hasher.update(previous_hash.as_bytes());
        hasher.update(timestamp.to_string().as_bytes());
        hasher.update(transaction.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Recompute this block's hash and compare it to the stored one.
    pub fn verify_hash(&self) -> bool {
        self.hash == Block::compute_hash(&self.previous_hash, self.timestamp, &self.transaction)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Block(hash={}, previous_hash={}, transaction={}, timestamp={})",
            self.hash, self.previous_hash, self.transaction, self.timestamp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_commits_to_the_contents() {
        let group = GroupParams::generate(64).unwrap();
        let keypair = SchnorrKeyPair::generate(&group, 64);

        let tx = Transaction::plain(keypair.public().clone(), keypair.sign("m"), "m".into());
        let block = Block::new(tx.clone(), GENESIS_PREVIOUS_HASH.into(), 1_000);

        assert!(block.verify_hash());
        assert_eq!(block.hash.len(), 64);

        let mut tampered = block.clone();
        tampered.timestamp += 1;
        assert!(!tampered.verify_hash());

        let rehashed = Block::new(tx, block.hash.clone(), 2_000);
        assert_eq!(rehashed.previous_hash, block.hash);
        assert!(rehashed.verify_hash());
    }
}

use crate::*;
use indexmap::IndexMap;
use num_bigint_dig::BigUint;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Minimum spacing between accepted transactions of one voter. 500 ms is a
/// simulation stand-in for a much longer real-world interval.
pub const DEFAULT_VOTE_INTERVAL: Duration = Duration::from_millis(500);

/// Verification of the zero-knowledge proofs attached to votes and
/// decryption contributions. Real proof systems plug in here; the simulated
/// default is [`AcceptAllProofs`].
pub trait ProofVerifier {
    /// Does `proof` show that `ballot` encrypts 0 or 1 under `election_key`?
    fn verify_vote_proof(
        &self,
        proof: &str,
        election_key: &ElGamalPublicKey,
        ballot: &Ciphertext,
    ) -> bool;

    /// Does `proof` show that `contribution` is `nonce_component` raised to
    /// the share behind `authority_key`?
    fn verify_decryption_proof(
        &self,
        proof: &str,
        contribution: &BigUint,
        authority_key: &ElGamalPublicKey,
        nonce_component: &BigUint,
    ) -> bool;
}

/// Simulated proof verification: every proof is valid.
pub struct AcceptAllProofs;

impl ProofVerifier for AcceptAllProofs {
    fn verify_vote_proof(&self, _: &str, _: &ElGamalPublicKey, _: &Ciphertext) -> bool {
        true
    }

    fn verify_decryption_proof(&self, _: &str, _: &BigUint, _: &ElGamalPublicKey, _: &BigUint) -> bool {
        true
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VotingPhase {
    NotStarted,
    InProgress,
    Ended,
}

/// The canonical string form of a voter-registration list, covered by the
/// registration transaction's joint signature.
pub fn registration_message(identities: &[BigUint]) -> String {
    let rendered: Vec<String> = identities.iter().map(|h| h.to_string()).collect();
    format!("[{}]", rendered.join(", "))
}

/// The append-only, hash-linked transaction ledger, together with the state
/// the voting protocol derives from it: the voter registry, the anti-replay
/// timestamps and the voting phase.
///
/// The ledger is a single-writer structure. Owning it (or an `&mut`) is the
/// serialization boundary: every append verifies, hashes, appends and
/// updates the derived maps as one uninterruptible sequence, so the hash
/// chain and the registry can never observe a half-applied transaction.
/// Rejections leave the ledger untouched and are reported as
/// [`ValidationError`] values rather than dropped silently.
pub struct Ledger {
    blocks: Vec<Block>,
    registry: IndexMap<BigUint, usize>,
    last_transaction: HashMap<BigUint, Instant>,
    phase: VotingPhase,
    start_index: Option<usize>,
    stop_index: Option<usize>,
    vote_interval: Duration,
    proofs: Box<dyn ProofVerifier>,
    audit: Option<AuditLog>,
}

impl Ledger {
    /// An empty in-memory ledger with the default vote interval and
    /// accept-all proof verification.
    pub fn new() -> Self {
        Ledger {
            blocks: Vec::new(),
            registry: IndexMap::new(),
            last_transaction: HashMap::new(),
            phase: VotingPhase::NotStarted,
            start_index: None,
            stop_index: None,
            vote_interval: DEFAULT_VOTE_INTERVAL,
            proofs: Box::new(AcceptAllProofs),
            audit: None,
        }
    }

    /// A ledger that mirrors every accepted block to an audit file, created
    /// fresh (truncated) at construction.
    pub fn with_audit_log<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let mut ledger = Ledger::new();
        ledger.audit = Some(AuditLog::create(path)?);
        Ok(ledger)
    }

    pub fn set_vote_interval(&mut self, interval: Duration) {
        self.vote_interval = interval;
    }

    pub fn set_proof_verifier(&mut self, verifier: Box<dyn ProofVerifier>) {
        self.proofs = verifier;
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn phase(&self) -> VotingPhase {
        self.phase
    }

    pub fn start_index(&self) -> Option<usize> {
        self.start_index
    }

    pub fn stop_index(&self) -> Option<usize> {
        self.stop_index
    }

    pub fn is_registered(&self, identity: &BigUint) -> bool {
        self.registry.contains_key(identity)
    }

    /// Registration index of a voter identity, in registration order.
    pub fn voter_index(&self, identity: &BigUint) -> Option<usize> {
        self.registry.get(identity).copied()
    }

    /// Insert the genesis transaction: the global ElGamal public key,
    /// jointly signed by the authorities. Must be the first block.
    pub fn append_genesis(
        &mut self,
        election_key: &ElGamalPublicKey,
        joint_pk: &SchnorrPublicKey,
        joint_sig: &SchnorrSignature,
    ) -> Result<(), Error> {
        if !self.blocks.is_empty() {
            return Err(ValidationError::GenesisNotFirst.into());
        }
        self.insert_signed_transaction(joint_pk, joint_sig, election_key.h.to_string())
    }

    /// Register the given voter identities and append the jointly signed
    /// registration transaction. Each identity may be registered at most
    /// once; a duplicate (in the batch or against the registry) rejects the
    /// whole transaction before any state changes.
    pub fn register_voters(
        &mut self,
        joint_pk: &SchnorrPublicKey,
        joint_sig: &SchnorrSignature,
        identities: &[BigUint],
    ) -> Result<(), Error> {
        let message = registration_message(identities);

        let tx = Transaction::plain(joint_pk.clone(), joint_sig.clone(), message);
        tx.verify_signature()?;

        for (i, identity) in identities.iter().enumerate() {
            if self.registry.contains_key(identity) || identities[..i].contains(identity) {
                return Err(ValidationError::VoterAlreadyRegistered.into());
            }
        }

        self.append(tx)?;

        for identity in identities {
            let index = self.registry.len();
            self.registry.insert(identity.clone(), index);
        }
        log::debug!("registered {} voters", identities.len());
        Ok(())
    }

    /// Generic append: verify the signature over `message`, then chain a new
    /// block. A failed verification rejects without touching the ledger.
    pub fn insert_signed_transaction(
        &mut self,
        pk: &SchnorrPublicKey,
        sig: &SchnorrSignature,
        message: String,
    ) -> Result<(), Error> {
        let tx = Transaction::plain(pk.clone(), sig.clone(), message);
        tx.verify_signature()?;
        self.append(tx)
    }

    /// As [`insert_signed_transaction`], with the signature verified over
    /// `message || proof`.
    ///
    /// [`insert_signed_transaction`]: Ledger::insert_signed_transaction
    pub fn insert_signed_transaction_with_proof(
        &mut self,
        pk: &SchnorrPublicKey,
        sig: &SchnorrSignature,
        message: String,
        proof: String,
    ) -> Result<(), Error> {
        let tx = Transaction::with_proof(pk.clone(), sig.clone(), message, proof);
        tx.verify_signature()?;
        self.append(tx)
    }

    /// Append an authority's decryption contribution: check the (pluggable)
    /// correctness proof, then insert the proof-carrying transaction.
    pub fn insert_decryption_contribution(
        &mut self,
        pk: &SchnorrPublicKey,
        sig: &SchnorrSignature,
        message: String,
        proof: String,
        contribution: &BigUint,
        nonce_component: &BigUint,
        authority_key: &ElGamalPublicKey,
    ) -> Result<(), Error> {
        if !self
            .proofs
            .verify_decryption_proof(&proof, contribution, authority_key, nonce_component)
        {
            return Err(ValidationError::ProofInvalid.into());
        }
        self.insert_signed_transaction_with_proof(pk, sig, message, proof)
    }

    /// Append a ballot. Accepted only when the signer is registered, the
    /// vote-correctness proof passes, voting is in progress, and the voter's
    /// previous accepted transaction is older than the vote interval. The
    /// voter's anti-replay timestamp is recorded only after the block has
    /// actually been appended.
    pub fn insert_vote(
        &mut self,
        election_key: &ElGamalPublicKey,
        voter: &SchnorrPublicKey,
        sig: &SchnorrSignature,
        ballot: &Ciphertext,
        proof: &str,
    ) -> Result<(), Error> {
        if !self.registry.contains_key(&voter.h) {
            return Err(ValidationError::VoterNotRegistered.into());
        }
        if !self.proofs.verify_vote_proof(proof, election_key, ballot) {
            return Err(ValidationError::ProofInvalid.into());
        }
        if self.phase != VotingPhase::InProgress {
            return Err(ValidationError::VotingNotInProgress.into());
        }
        if !self.vote_interval_elapsed(&voter.h) {
            return Err(ValidationError::VoteRateLimited.into());
        }

        self.insert_signed_transaction_with_proof(
            voter,
            sig,
            ballot.to_string(),
            proof.to_string(),
        )?;
        self.last_transaction.insert(voter.h.clone(), Instant::now());
        Ok(())
    }

    /// Open the voting window: append the jointly signed start transaction,
    /// flip the phase and record the start block index. Starting twice, or
    /// after the window has closed, is rejected.
    pub fn start_voting(
        &mut self,
        joint_pk: &SchnorrPublicKey,
        joint_sig: &SchnorrSignature,
        message: String,
    ) -> Result<(), Error> {
        match self.phase {
            VotingPhase::NotStarted => {}
            VotingPhase::InProgress => return Err(ValidationError::VotingAlreadyStarted.into()),
            VotingPhase::Ended => return Err(ValidationError::VotingAlreadyEnded.into()),
        }

        self.insert_signed_transaction(joint_pk, joint_sig, message)?;
        self.phase = VotingPhase::InProgress;
        self.start_index = Some(self.blocks.len() - 1);
        log::debug!("voting started at block {}", self.blocks.len() - 1);
        Ok(())
    }

    /// Close the voting window. Stopping before a start, or twice, is
    /// rejected.
    pub fn stop_voting(
        &mut self,
        joint_pk: &SchnorrPublicKey,
        joint_sig: &SchnorrSignature,
        message: String,
    ) -> Result<(), Error> {
        match self.phase {
            VotingPhase::InProgress => {}
            VotingPhase::NotStarted => return Err(ValidationError::VotingNotStarted.into()),
            VotingPhase::Ended => return Err(ValidationError::VotingAlreadyEnded.into()),
        }

        self.insert_signed_transaction(joint_pk, joint_sig, message)?;
        self.phase = VotingPhase::Ended;
        self.stop_index = Some(self.blocks.len() - 1);
        log::debug!("voting stopped at block {}", self.blocks.len() - 1);
        Ok(())
    }

    /// Combine the ballots cast inside the closed voting window into one
    /// ciphertext encrypting the number of votes for option 1.
    ///
    /// Only the most recent ballot of each signer survives: later blocks
    /// overwrite earlier ones from the same identity, which is how double
    /// voting is neutralized. Every block inside the window must carry a
    /// proof-bearing transaction; anything else is a hard
    /// [`Error::MalformedTransaction`].
    pub fn tally(&self, election_key: &ElGamalPublicKey) -> Result<Ciphertext, Error> {
        let (start, stop) = match (self.start_index, self.stop_index) {
            (Some(start), Some(stop)) => (start, stop),
            _ => return Err(Error::VotingStillOpen),
        };

        let mut latest: IndexMap<BigUint, Ciphertext> = IndexMap::new();
        for index in start + 1..stop {
            let tx = &self.blocks[index].transaction;
            match &tx.payload {
                Payload::WithProof { message, .. } => {
                    let ballot = Ciphertext::from_str(message)?;
                    latest.insert(tx.signer.h.clone(), ballot);
                }
                Payload::Plain { .. } => return Err(Error::MalformedTransaction(index)),
            }
        }

        Ok(election_key.combine(latest.values()))
    }

    /// The authorities' decryption contributions, read from every block
    /// strictly after the stop transaction, in chain order.
    pub fn authority_contributions(&self) -> Result<Vec<BigUint>, Error> {
        let stop = self.stop_index.ok_or(Error::VotingStillOpen)?;

        let mut contributions = Vec::new();
        for index in stop + 1..self.blocks.len() {
            let tx = &self.blocks[index].transaction;
            match &tx.payload {
                Payload::WithProof { message, .. } => {
                    let w = BigUint::from_str(message)
                        .map_err(|_| Error::MalformedContribution(index))?;
                    contributions.push(w);
                }
                Payload::Plain { .. } => return Err(Error::MalformedTransaction(index)),
            }
        }

        Ok(contributions)
    }

    fn vote_interval_elapsed(&self, identity: &BigUint) -> bool {
        match self.last_transaction.get(identity) {
            Some(last) => last.elapsed() > self.vote_interval,
            None => true,
        }
    }

    /// Chain a verified transaction: hash against the last block (or the
    /// genesis sentinel), mirror the block to the audit log, then append.
    fn append(&mut self, transaction: Transaction) -> Result<(), Error> {
        let previous_hash = match self.blocks.last() {
            Some(block) => block.hash.clone(),
            None => GENESIS_PREVIOUS_HASH.to_string(),
        };

        let block = Block::new(transaction, previous_hash, now_millis());
        if let Some(audit) = &self.audit {
            audit.append(&block)?;
        }

        log::debug!("block {} appended", self.blocks.len());
        self.blocks.push(block);
        Ok(())
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Ledger::new()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

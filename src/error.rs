use num_bigint_dig::BigUint;
use thiserror::Error;

/// Error types
#[derive(Debug, Error)]
pub enum Error {
    #[error("votechain: group generation failed after {0} attempts")]
    GenerationFailed(usize),

    #[error("votechain: no exponent below {0} matches the decrypted element")]
    RecoveryBoundExceeded(BigUint),

    #[error("votechain: joint signature requires at least one signer")]
    EmptySignerList,

    #[error("votechain: secret sharing requires at least one shareholder")]
    NoShareholders,

    #[error("votechain: authority holds no decryption key share")]
    MissingKeyShare,

    #[error("votechain: decryption contributions could not be combined")]
    DecryptionFailed,

    #[error("votechain: block {0} holds a plain transaction where a proof-carrying one is required")]
    MalformedTransaction(usize),

    #[error("votechain: malformed ciphertext encoding: {0}")]
    MalformedCiphertext(String),

    #[error("votechain: block {0} holds a malformed decryption contribution")]
    MalformedContribution(usize),

    #[error("votechain: portal line {0} is not a decimal public key")]
    MalformedPortalLine(usize),

    #[error("votechain: the voting window is not closed yet")]
    VotingStillOpen,

    #[error("votechain: transaction rejected: {0}")]
    Validation(#[from] ValidationError),

    #[error("votechain: i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transaction rejection reasons. An append that returns one of these left
/// the ledger untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("votechain validation: signature does not verify")]
    SignatureInvalid,

    #[error("votechain validation: proof does not verify")]
    ProofInvalid,

    #[error("votechain validation: genesis transaction must be the first block")]
    GenesisNotFirst,

    #[error("votechain validation: voter is not registered")]
    VoterNotRegistered,

    #[error("votechain validation: voter is already registered")]
    VoterAlreadyRegistered,

    #[error("votechain validation: voting is not in progress")]
    VotingNotInProgress,

    #[error("votechain validation: voter must wait out the minimum transaction interval")]
    VoteRateLimited,

    #[error("votechain validation: voting has already started")]
    VotingAlreadyStarted,

    #[error("votechain validation: voting has already ended")]
    VotingAlreadyEnded,

    #[error("votechain validation: voting has not started")]
    VotingNotStarted,
}

use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Proof(#[from] ProofError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Other(#[from] AnyhowError),
}

/// Errors raised while decoding keys and records from their fixed-width
/// byte encodings, before any of the bytes are used.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("malformed share key: expected {expected} bytes, got {actual}")]
    MalformedKey { expected: usize, actual: usize },
    #[error("malformed share record: expected {expected} bytes, got {actual}")]
    MalformedRecord { expected: usize, actual: usize },
    #[error("malformed share record: paid flag must be 0 or 1, got {0}")]
    InvalidPaidFlag(u8),
}

/// Errors raised by the authoritative tree while preparing or applying a
/// batch. Any of these aborts the batch before a single node is written.
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("refusing to apply an empty batch")]
    EmptyBatch,
    #[error("key {0} already present")]
    DuplicateKey(String),
    #[error("key {0} not present")]
    UnknownKey(String),
    #[error("delete targets absent key {0}")]
    DeleteNonexistent(String),
    #[error("tree is uninitialized: {0}")]
    Uninitialized(String),
}

#[derive(Error, Debug)]
pub enum ProofError {
    #[error("proof does not authenticate claimed values: {0}")]
    VerificationFailed(String),
    #[error("replayed proof: generated against digest {proof_digest}, committed digest is {committed_digest}")]
    ReplayedProof {
        committed_digest: String,
        proof_digest: String,
    },
    #[error("digest chain broken: proof yields {computed}, claimed {claimed}")]
    DigestMismatch { computed: String, claimed: String },
    #[error("proof entries do not match claimed updates at index {0}")]
    ClaimMismatch(usize),
    #[error("encoding proof: {0}")]
    EncodingError(String),
    #[error("decoding proof: {0}")]
    DecodingError(String),
}

/// Rejections produced by the settlement validator. One variant per
/// mandatory check; the first failing check voids the whole batch.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransitionError {
    #[error("updates and outputs differ in length: {updates} != {outputs}")]
    LengthMismatch { updates: usize, outputs: usize },
    #[error("output {index} does not pay the key it claims to settle")]
    OutputKeyMismatch { index: usize },
    #[error("no record on file for key {0}")]
    MissingRecord(String),
    #[error("record for key {0} was already paid")]
    AlreadyPaid(String),
    #[error("record for key {0} must be marked paid by this transition")]
    NotMarkedPaid(String),
    #[error("score for key {key} changed across payout: {old} -> {new}")]
    ScoreChanged { key: String, old: u64, new: u64 },
    #[error("payout {index}: expected {expected}, claimed {claimed}")]
    PayoutMismatch {
        index: usize,
        expected: u64,
        claimed: u64,
    },
    #[error("payout amount exceeds representable range")]
    PayoutOverflow,
    #[error("reward delta {claimed} does not equal payout sum {expected}")]
    ConservationViolation { expected: u128, claimed: i128 },
    #[error("reward pool holds {available}, cannot release {requested}")]
    PoolExhausted { requested: u64, available: u64 },
    #[error("max score must be non-zero")]
    InvalidMaxScore,
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("acquiring database lock")]
    LockError,
    #[error("{0} not found")]
    NotFoundError(String),
    #[error("reading {0} from database")]
    ReadError(String),
    #[error("writing {0} to database")]
    WriteError(String),
    #[error("deleting {0} from database")]
    DeleteError(String),
    #[error("initializing database: {0}")]
    InitializationError(String),
}

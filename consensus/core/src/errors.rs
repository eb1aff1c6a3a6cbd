use thiserror::Error;

use crate::coinbase::CoinbaseError;
use crate::tx::{TransactionId, TransactionOutpoint};
use crate::{BlueWorkType, Hash};

/// Transaction-level rule violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxRuleError {
    #[error("transaction has no inputs")]
    NoTxInputs,

    #[error("transaction has no outputs")]
    NoTxOutputs,

    #[error("transaction has duplicate input {0}")]
    TxDuplicateInputs(TransactionOutpoint),

    #[error("transaction output value {0} is higher than the max allowed amount")]
    TxOutTooHigh(u64),

    #[error("transaction output values overflow")]
    OutputsValueOverflow,

    #[error("transaction input values overflow")]
    InputAmountOverflow,

    #[error("coinbase transaction has inputs")]
    CoinbaseHasInputs,

    #[error("outpoint {0} is missing from the utxo set")]
    MissingTxOutpoints(TransactionOutpoint),

    #[error("coinbase output {0} of daa score {1} is not mature at daa score {2}")]
    ImmatureCoinbaseSpend(TransactionOutpoint, u64, u64),

    #[error("total spent {0} is higher than total input {1}")]
    SpendTooHigh(u64, u64),

    #[error("output {0} already exists in the utxo set")]
    OutputAlreadyExists(TransactionOutpoint),
}

/// A terminal protocol violation. A block rejected with a rule error must never be retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("wrong block version: got {0} but expected {1}")]
    WrongBlockVersion(u16, u16),

    #[error("block has no transactions")]
    NoTransactions,

    #[error("block merkle root is invalid: expected {0} but got {1}")]
    BadMerkleRoot(Hash, Hash),

    #[error("first transaction in block is not a coinbase")]
    FirstTxNotCoinbase,

    #[error("block has a second coinbase at index {0}")]
    MultipleCoinbases(usize),

    #[error("coinbase payload length is {0} while the maximum allowed length is {1}")]
    BadCoinbasePayloadLen(usize, usize),

    #[error("bad coinbase payload: {0}")]
    BadCoinbasePayload(#[from] CoinbaseError),

    #[error("coinbase blue score of {0} is not the expected value of {1}")]
    BadCoinbasePayloadBlueScore(u64, u64),

    #[error("coinbase subsidy is {0} while the expected subsidy is {1}")]
    BadCoinbaseSubsidy(u64, u64),

    #[error("coinbase outputs sum to {0} while the subsidy is {1}")]
    BadCoinbaseOutputs(u64, u64),

    #[error("block contains duplicate transaction {0}")]
    DuplicateTransactions(TransactionId),

    #[error("transaction {0} failed isolation check: {1}")]
    TxInIsolationValidationFailed(TransactionId, TxRuleError),

    #[error("block mass {0} is above the maximum of {1}")]
    ExceedsMassLimit(u64, u64),

    #[error("block has no parents")]
    NoParents,

    #[error("block has {0} parents while the maximum allowed is {1}")]
    TooManyParents(usize, usize),

    #[error("block has duplicate parent {0}")]
    DuplicateParents(Hash),

    #[error("block has invalid proof of work")]
    InvalidPoW,

    #[error("block difficulty of {0:#x} is not the expected value of {1:#x}")]
    UnexpectedDifficulty(u32, u32),

    #[error("block timestamp of {0} is not after the past median time of {1}")]
    TimeTooOld(u64, u64),

    #[error("block timestamp of {0} is too far in the future, the maximum allowed is {1}")]
    TimeTooFarIntoTheFuture(u64, u64),

    #[error("block is missing parents: {0:?}")]
    MissingParents(Vec<Hash>),

    #[error("parent {0} is invalid")]
    InvalidParent(Hash),

    #[error("parent {0} was pruned")]
    PrunedParent(Hash),

    #[error("parent {0} is an ancestor of parent {1}")]
    InvalidParentsRelation(Hash, Hash),

    #[error("red block {0} in the mergeset is deeper than the merge depth bound")]
    ViolatingBoundedMergeDepth(Hash),

    #[error("mergeset size of {0} exceeds the limit of {1}")]
    MergesetTooBig(u64, u64),

    #[error("block blue score of {0} is not the expected value of {1}")]
    UnexpectedBlueScore(u64, u64),

    #[error("block blue work of {0} is not the expected value of {1}")]
    UnexpectedBlueWork(BlueWorkType, BlueWorkType),

    #[error("block daa score of {0} is not the expected value of {1}")]
    UnexpectedDaaScore(u64, u64),

    #[error("block parents by level do not match the expected parents")]
    UnexpectedParentsByLevel,

    #[error("block pruning point {0} is not the expected pruning point {1}")]
    WrongPruningPoint(Hash, Hash),

    #[error("block {0} utxo commitment is {1} while the resulting state commitment is {2}")]
    BadUtxoCommitment(Hash, Hash, Hash),

    #[error("block {0} accepted id merkle root is {1} while the computed root is {2}")]
    BadAcceptedIdMerkleRoot(Hash, Hash, Hash),

    #[error("transaction {0} is invalid in the block utxo context: {1}")]
    InvalidTransactionsInUtxoContext(TransactionId, TxRuleError),

    #[error("block is known to be invalid")]
    KnownInvalid,

    #[error("invalid pruning point proof: {0}")]
    BadPruningProof(String),
}

impl RuleError {
    /// A block rejected with a deferrable error is not invalid yet and may be resubmitted once its time arrives
    pub fn is_deferrable(&self) -> bool {
        matches!(self, RuleError::TimeTooFarIntoTheFuture(..))
    }

    /// Whether the block hash should be persisted as `Invalid`. Errors that depend on local
    /// state, on wall-clock time or on a body that does not match the header are not cached.
    /// Neither are UTXO-context failures: such a block stays in the DAG, disqualified from the chain.
    pub fn caches_invalid_status(&self) -> bool {
        !matches!(
            self,
            RuleError::MissingParents(_)
                | RuleError::TimeTooFarIntoTheFuture(..)
                | RuleError::KnownInvalid
                | RuleError::PrunedParent(_)
                | RuleError::BadMerkleRoot(..)
                | RuleError::BadPruningProof(_)
                | RuleError::BadUtxoCommitment(..)
                | RuleError::BadAcceptedIdMerkleRoot(..)
                | RuleError::InvalidTransactionsInUtxoContext(..)
        )
    }
}

/// The two-class consensus error. `Rule` is terminal for the submitted block,
/// `Internal` is a local failure the caller may retry after recovery.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("{0}")]
    Rule(#[from] RuleError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ConsensusError {
    pub fn internal(msg: impl std::fmt::Display) -> Self {
        ConsensusError::Internal(msg.to_string())
    }

    pub fn cancelled() -> Self {
        ConsensusError::Internal("operation cancelled".to_string())
    }

    pub fn is_rule_error(&self) -> bool {
        matches!(self, ConsensusError::Rule(_))
    }

    pub fn as_rule_error(&self) -> Option<&RuleError> {
        match self {
            ConsensusError::Rule(e) => Some(e),
            ConsensusError::Internal(_) => None,
        }
    }
}

pub type ConsensusResult<T> = std::result::Result<T, ConsensusError>;
pub type BlockProcessResult<T> = std::result::Result<T, RuleError>;
pub type TxResult<T> = std::result::Result<T, TxRuleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        let future = RuleError::TimeTooFarIntoTheFuture(10, 5);
        assert!(future.is_deferrable());
        assert!(!future.caches_invalid_status());
        assert!(RuleError::MergesetTooBig(181, 180).caches_invalid_status());
        assert!(!RuleError::MissingParents(vec![]).caches_invalid_status());
        assert!(!RuleError::BadUtxoCommitment(Hash::default(), Hash::default(), Hash::default()).caches_invalid_status());

        let err: ConsensusError = RuleError::InvalidPoW.into();
        assert!(err.is_rule_error());
        assert_eq!(err.to_string(), "block has invalid proof of work");
        assert!(!ConsensusError::internal("disk").is_rule_error());
    }
}

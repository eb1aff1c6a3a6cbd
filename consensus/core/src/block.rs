use serde::{Deserialize, Serialize};

use crate::{header::Header, tx::Transaction, Hash};

/// Complete block structure including header and transactions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub header: Header,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        Self { header, transactions }
    }

    pub fn hash(&self) -> Hash {
        self.header.hash
    }

    pub fn is_genesis(&self) -> bool {
        self.header.parents_by_level.is_empty()
    }

    /// Recomputes the cached header hash and transaction ids, which are not trusted when
    /// a block arrives from outside
    pub fn finalize(&mut self) {
        self.header.finalize();
        for tx in self.transactions.iter_mut() {
            tx.finalize();
        }
    }
}

/// Body of a block as persisted apart from its header
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBody {
    pub transactions: Vec<Transaction>,
}

/// Block built on top of the current virtual, ready for nonce search
#[derive(Clone, Debug)]
pub struct BlockTemplate {
    pub block: Block,
    pub selected_parent_hash: Hash,
    pub subsidy: u64,
}

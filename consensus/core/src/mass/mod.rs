use crate::config::params::Params;
use crate::subnets::SUBNETWORK_ID_SIZE;
use crate::tx::{Transaction, TransactionInput, TransactionOutput};
use crate::HASH_SIZE;

// transaction_estimated_serialized_size is the estimated size of a transaction in some
// serialization. This has to be deterministic, but not necessarily accurate, since
// it's only used as the size component in the transaction and block mass limit
// calculation.
pub fn transaction_estimated_serialized_size(tx: &Transaction) -> u64 {
    let mut size: u64 = 0;
    size += 2; // Tx version (u16)
    size += 8; // Number of inputs (u64)
    size += tx.inputs.iter().map(transaction_input_estimated_serialized_size).sum::<u64>();

    size += 8; // number of outputs (u64)
    size += tx.outputs.iter().map(transaction_output_estimated_serialized_size).sum::<u64>();

    size += 8; // lock time (u64)
    size += SUBNETWORK_ID_SIZE as u64;
    size += 8; // gas (u64)
    size += HASH_SIZE as u64; // payload hash

    size += 8; // length of the payload (u64)
    size += tx.payload.len() as u64;
    size
}

fn transaction_input_estimated_serialized_size(input: &TransactionInput) -> u64 {
    let mut size = 0;
    size += outpoint_estimated_serialized_size();

    size += 8; // length of signature script (u64)
    size += input.signature_script.len() as u64;

    size += 8; // sequence (uint64)
    size
}

const fn outpoint_estimated_serialized_size() -> u64 {
    HASH_SIZE as u64 + 4
}

pub fn transaction_output_estimated_serialized_size(output: &TransactionOutput) -> u64 {
    let mut size: u64 = 0;
    size += 8; // value (u64)
    size += 2; // output.ScriptPublicKey.Version (u16)
    size += 8; // length of script public key (u64)
    size += output.script_public_key.script().len() as u64;
    size
}

/// Computes context-free transaction and block masses
#[derive(Clone, Debug)]
pub struct MassCalculator {
    mass_per_tx_byte: u64,
    mass_per_script_pub_key_byte: u64,
    mass_per_sig_op: u64,
}

impl MassCalculator {
    pub fn new(mass_per_tx_byte: u64, mass_per_script_pub_key_byte: u64, mass_per_sig_op: u64) -> Self {
        Self { mass_per_tx_byte, mass_per_script_pub_key_byte, mass_per_sig_op }
    }

    pub fn new_with_consensus_params(params: &Params) -> Self {
        Self::new(params.mass_per_tx_byte, params.mass_per_script_pub_key_byte, params.mass_per_sig_op)
    }

    pub fn calc_tx_mass(&self, tx: &Transaction) -> u64 {
        let size = transaction_estimated_serialized_size(tx);
        if tx.is_coinbase() {
            return size * self.mass_per_tx_byte;
        }
        let script_pub_key_size: u64 =
            tx.outputs.iter().map(|output| 2 + output.script_public_key.script().len() as u64).sum();
        let sig_op_count: u64 = tx.inputs.iter().map(|input| input.sig_op_count as u64).sum();
        size * self.mass_per_tx_byte
            + script_pub_key_size * self.mass_per_script_pub_key_byte
            + sig_op_count * self.mass_per_sig_op
    }

    /// Sum of transaction masses, saturating at `u64::MAX`
    pub fn calc_block_mass<'a>(&self, txs: impl IntoIterator<Item = &'a Transaction>) -> u64 {
        txs.into_iter().fold(0u64, |acc, tx| acc.saturating_add(self.calc_tx_mass(tx)))
    }
}

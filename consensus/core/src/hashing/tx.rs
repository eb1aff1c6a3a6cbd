use stokes_hashes::{Hasher, TransactionId as TransactionIdHasher};

use crate::tx::{Transaction, TransactionId};

/// Computes the transaction id over all transaction fields
pub fn id(tx: &Transaction) -> TransactionId {
    let mut hasher = TransactionIdHasher::new();
    hasher.write_u16(tx.version).write_u64(tx.inputs.len() as u64);
    for input in &tx.inputs {
        hasher
            .update(input.previous_outpoint.transaction_id)
            .write_u32(input.previous_outpoint.index)
            .write_var_bytes(&input.signature_script)
            .write_u64(input.sequence)
            .write_u8(input.sig_op_count);
    }
    hasher.write_u64(tx.outputs.len() as u64);
    for output in &tx.outputs {
        hasher
            .write_u64(output.value)
            .write_u16(output.script_public_key.version)
            .write_var_bytes(output.script_public_key.script());
    }
    hasher.write_u64(tx.lock_time).update(tx.subnetwork_id.as_bytes()).write_u64(tx.gas).write_var_bytes(&tx.payload);
    hasher.finalize()
}

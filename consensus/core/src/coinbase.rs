//! Coinbase payload layout:
//! `blue_score: u64 LE | subsidy: u64 LE | script_version: u16 LE | script_len: u8 | script | extra_data`

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tx::{ScriptPublicKey, ScriptVec};

const LENGTH_OF_BLUE_SCORE: usize = 8;
const LENGTH_OF_SUBSIDY: usize = 8;
const LENGTH_OF_SCRIPT_PUB_KEY_VERSION: usize = 2;
const LENGTH_OF_SCRIPT_PUB_KEY_LENGTH: usize = 1;

pub const MIN_PAYLOAD_LENGTH: usize =
    LENGTH_OF_BLUE_SCORE + LENGTH_OF_SUBSIDY + LENGTH_OF_SCRIPT_PUB_KEY_VERSION + LENGTH_OF_SCRIPT_PUB_KEY_LENGTH;

/// Data a miner puts into its coinbase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinerData {
    pub script_public_key: ScriptPublicKey,
    pub extra_data: Vec<u8>,
}

impl MinerData {
    pub fn new(script_public_key: ScriptPublicKey, extra_data: Vec<u8>) -> Self {
        Self { script_public_key, extra_data }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinbaseData {
    pub blue_score: u64,
    pub subsidy: u64,
    pub miner_data: MinerData,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoinbaseError {
    #[error("coinbase payload length is {0} while the minimum allowed length is {1}")]
    PayloadLenBelowMin(usize, usize),

    #[error("coinbase payload script length {0} exceeds the remaining {1} bytes")]
    PayloadCantContainScriptPublicKey(usize, usize),

    #[error("coinbase script public key length {0} is above the maximum of {1}")]
    PayloadScriptPublicKeyLenAboveMax(usize, usize),
}

impl CoinbaseData {
    pub fn new(blue_score: u64, subsidy: u64, miner_data: MinerData) -> Self {
        Self { blue_score, subsidy, miner_data }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, CoinbaseError> {
        let script = self.miner_data.script_public_key.script();
        if script.len() > u8::MAX as usize {
            return Err(CoinbaseError::PayloadScriptPublicKeyLenAboveMax(script.len(), u8::MAX as usize));
        }
        let mut payload = Vec::with_capacity(MIN_PAYLOAD_LENGTH + script.len() + self.miner_data.extra_data.len());
        payload.extend_from_slice(&self.blue_score.to_le_bytes());
        payload.extend_from_slice(&self.subsidy.to_le_bytes());
        payload.extend_from_slice(&self.miner_data.script_public_key.version.to_le_bytes());
        payload.push(script.len() as u8);
        payload.extend_from_slice(script);
        payload.extend_from_slice(&self.miner_data.extra_data);
        Ok(payload)
    }

    pub fn deserialize(payload: &[u8]) -> Result<Self, CoinbaseError> {
        if payload.len() < MIN_PAYLOAD_LENGTH {
            return Err(CoinbaseError::PayloadLenBelowMin(payload.len(), MIN_PAYLOAD_LENGTH));
        }
        let (blue_score, rest) = payload.split_at(LENGTH_OF_BLUE_SCORE);
        let (subsidy, rest) = rest.split_at(LENGTH_OF_SUBSIDY);
        let (version, rest) = rest.split_at(LENGTH_OF_SCRIPT_PUB_KEY_VERSION);
        let (script_len, rest) = rest.split_at(LENGTH_OF_SCRIPT_PUB_KEY_LENGTH);
        let script_len = script_len[0] as usize;
        if rest.len() < script_len {
            return Err(CoinbaseError::PayloadCantContainScriptPublicKey(script_len, rest.len()));
        }
        let (script, extra_data) = rest.split_at(script_len);

        Ok(Self {
            blue_score: u64::from_le_bytes(le_array(blue_score)),
            subsidy: u64::from_le_bytes(le_array(subsidy)),
            miner_data: MinerData {
                script_public_key: ScriptPublicKey::new(u16::from_le_bytes(le_array(version)), ScriptVec::from_slice(script)),
                extra_data: extra_data.to_vec(),
            },
        })
    }
}

fn le_array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&slice[..N]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_layout() {
        let data = CoinbaseData::new(
            0x0102,
            50,
            MinerData::new(ScriptPublicKey::from_vec(3, vec![0xaa, 0xbb]), b"stokes".to_vec()),
        );
        let payload = data.serialize().unwrap();
        assert_eq!(&payload[..8], &0x0102u64.to_le_bytes());
        assert_eq!(&payload[8..16], &50u64.to_le_bytes());
        assert_eq!(&payload[16..18], &3u16.to_le_bytes());
        assert_eq!(payload[18], 2);
        assert_eq!(&payload[19..21], &[0xaa, 0xbb]);
        assert_eq!(&payload[21..], b"stokes");
        assert_eq!(CoinbaseData::deserialize(&payload).unwrap(), data);
    }

    #[test]
    fn test_truncated_payloads() {
        assert_eq!(CoinbaseData::deserialize(&[0; 5]), Err(CoinbaseError::PayloadLenBelowMin(5, MIN_PAYLOAD_LENGTH)));
        let mut payload = vec![0u8; MIN_PAYLOAD_LENGTH];
        payload[18] = 4;
        payload.push(1);
        assert_eq!(CoinbaseData::deserialize(&payload), Err(CoinbaseError::PayloadCantContainScriptPublicKey(4, 1)));
    }
}

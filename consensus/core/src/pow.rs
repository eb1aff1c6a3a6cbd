//! Compact difficulty encoding, block work and block level

use primitive_types::U256;

use crate::header::Header;
use crate::{BlueWorkType, Hash};

/// Decodes Bitcoin-style compact bits into a 256-bit target. Negative or
/// overflowing encodings yield zero and `U256::MAX` respectively.
pub fn compact_to_target(bits: u32) -> U256 {
    let exponent = bits >> 24;
    let mantissa = bits & 0x007f_ffff;
    if bits & 0x0080_0000 != 0 || mantissa == 0 {
        return U256::zero();
    }
    if exponent <= 3 {
        U256::from(mantissa >> (8 * (3 - exponent)))
    } else if exponent > 34 {
        U256::MAX
    } else {
        let shifted = U256::from(mantissa) << (8 * (exponent - 3)) as usize;
        if shifted >> (8 * (exponent - 3)) as usize != U256::from(mantissa) {
            U256::MAX
        } else {
            shifted
        }
    }
}

/// Encodes a target into compact bits
pub fn target_to_compact(target: U256) -> u32 {
    let mut size = (target.bits() as u32 + 7) / 8;
    let mut compact = if size <= 3 {
        (target.low_u64() << (8 * (3 - size))) as u32
    } else {
        (target >> (8 * (size - 3)) as usize).low_u64() as u32
    };
    if compact & 0x0080_0000 != 0 {
        compact >>= 8;
        size += 1;
    }
    compact | (size << 24)
}

/// Expected number of hashes needed to find a block at `bits`
pub fn calc_work(bits: u32) -> BlueWorkType {
    let target = compact_to_target(bits);
    let (denominator, overflow) = target.overflowing_add(U256::one());
    if overflow {
        return BlueWorkType::from_u64(1);
    }
    let work = (!target / denominator).saturating_add(U256::one());
    BlueWorkType::saturating_from_u256(work)
}

/// Header hash interpreted as a big-endian 256-bit number
pub fn hash_to_u256(hash: &Hash) -> U256 {
    U256::from_big_endian(hash.as_bytes())
}

pub fn check_pow(header: &Header) -> bool {
    hash_to_u256(&header.hash) <= compact_to_target(header.bits)
}

/// Level of a block in the multi-level DAG used by pruning proofs
pub fn calc_block_level(hash: &Hash, max_block_level: u8) -> u8 {
    let leading_zeros = hash_to_u256(hash).leading_zeros();
    let level = leading_zeros.saturating_sub(256 - max_block_level as u32);
    level.min(max_block_level as u32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_round_trip() {
        for bits in [0x207fffffu32, 0x1e7fffff, 0x1d00ffff, 0x1b0404cb, 0x03123456] {
            assert_eq!(target_to_compact(compact_to_target(bits)), bits, "bits {bits:#x}");
        }
        assert_eq!(compact_to_target(0x1d00ffff), U256::from(0xffffu64) << 208);
    }

    #[test]
    fn test_negative_compact_is_zero() {
        assert_eq!(compact_to_target(0x04923456), U256::zero());
    }

    #[test]
    fn test_work_grows_with_difficulty() {
        let easy = calc_work(0x207fffff);
        let hard = calc_work(0x1e7fffff);
        assert!(hard > easy);
        assert_eq!(easy, BlueWorkType::from_u64(2));
    }

    #[test]
    fn test_block_level() {
        assert_eq!(calc_block_level(&Hash::from_bytes([0xff; 32]), 225), 0);
        let mut bytes = [0u8; 32];
        bytes[4] = 0x01; // 39 leading zero bits
        assert_eq!(calc_block_level(&Hash::from_bytes(bytes), 225), 8);
        assert_eq!(calc_block_level(&Hash::from_bytes([0u8; 32]), 225), 225);
    }
}

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign};

/// 192-bit unsigned integer stored as 3 little-endian u64 limbs.
/// Used for accumulated blue work, which can exceed u128 on long chains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Uint192([u64; 3]);

impl Uint192 {
    pub const ZERO: Uint192 = Uint192([0; 3]);
    pub const MAX: Uint192 = Uint192([u64::MAX; 3]);

    pub const fn from_u64(v: u64) -> Self {
        Self([v, 0, 0])
    }

    pub const fn from_limbs(limbs: [u64; 3]) -> Self {
        Self(limbs)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 3]
    }

    /// Returns little-endian bytes (24 bytes)
    pub fn to_le_bytes(&self) -> [u8; 24] {
        let mut out = [0u8; 24];
        for (i, limb) in self.0.iter().enumerate() {
            out[i * 8..(i + 1) * 8].copy_from_slice(&limb.to_le_bytes());
        }
        out
    }

    pub fn from_le_bytes(bytes: [u8; 24]) -> Self {
        let mut limbs = [0u64; 3];
        for (i, limb) in limbs.iter_mut().enumerate() {
            let mut word = [0u8; 8];
            word.copy_from_slice(&bytes[i * 8..(i + 1) * 8]);
            *limb = u64::from_le_bytes(word);
        }
        Self(limbs)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        let (r, overflow) = self.overflowing_add(rhs);
        (!overflow).then_some(r)
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        self.checked_add(rhs).unwrap_or(Self::MAX)
    }

    fn overflowing_add(self, rhs: Self) -> (Self, bool) {
        let mut out = [0u64; 3];
        let mut carry = false;
        for (i, limb) in out.iter_mut().enumerate() {
            let (s1, c1) = self.0[i].overflowing_add(rhs.0[i]);
            let (s2, c2) = s1.overflowing_add(carry as u64);
            *limb = s2;
            carry = c1 || c2;
        }
        (Self(out), carry)
    }

    /// Narrows a 256-bit value, clamping at [`Uint192::MAX`]
    pub fn saturating_from_u256(v: U256) -> Self {
        if v.0[3] != 0 {
            return Self::MAX;
        }
        Self([v.0[0], v.0[1], v.0[2]])
    }

    pub fn to_u256(self) -> U256 {
        U256([self.0[0], self.0[1], self.0[2], 0])
    }
}

impl From<u64> for Uint192 {
    fn from(v: u64) -> Self {
        Self::from_u64(v)
    }
}

impl Ord for Uint192 {
    fn cmp(&self, other: &Self) -> Ordering {
        // Most significant limb first
        self.0.iter().rev().cmp(other.0.iter().rev())
    }
}

impl PartialOrd for Uint192 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl AddAssign for Uint192 {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.saturating_add(rhs);
    }
}

impl Add for Uint192 {
    type Output = Uint192;
    fn add(self, rhs: Self) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl fmt::Display for Uint192 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        let bytes = self.to_le_bytes();
        let significant = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i);
        for byte in bytes[..=significant].iter().rev() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

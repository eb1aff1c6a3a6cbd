use crate::Hash;

/// Incremental hasher producing a [`Hash`].
pub trait Hasher: Clone + Default {
    fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self;

    fn finalize(self) -> Hash;

    #[inline]
    fn hash<A: AsRef<[u8]>>(data: A) -> Hash {
        let mut hasher = Self::default();
        hasher.update(data);
        hasher.finalize()
    }

    fn write_u8(&mut self, v: u8) -> &mut Self {
        self.update([v])
    }

    fn write_u16(&mut self, v: u16) -> &mut Self {
        self.update(v.to_le_bytes())
    }

    fn write_u32(&mut self, v: u32) -> &mut Self {
        self.update(v.to_le_bytes())
    }

    fn write_u64(&mut self, v: u64) -> &mut Self {
        self.update(v.to_le_bytes())
    }

    /// Writes a length-prefixed byte string
    fn write_var_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_u64(bytes.len() as u64).update(bytes)
    }
}

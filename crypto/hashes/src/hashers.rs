use crate::hasher::Hasher;
use crate::Hash;
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};

macro_rules! sha256_hasher {
    ($(struct $name:ident => $domain_sep:literal),+ $(,)? ) => {$(
        #[derive(Clone)]
        pub struct $name(Sha256);

        impl $name {
            #[inline]
            pub fn new() -> Self {
                // The domain tag is absorbed once and the primed state is cloned on every use
                static HASHER: Lazy<$name> = Lazy::new(|| {
                    let tag = Sha256::digest($domain_sep.as_bytes());
                    let mut state = Sha256::new();
                    state.update(tag);
                    state.update(tag);
                    $name(state)
                });
                (*HASHER).clone()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Hasher for $name {
            #[inline]
            fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self {
                self.0.update(data.as_ref());
                self
            }

            #[inline]
            fn finalize(self) -> Hash {
                let out: [u8; 32] = self.0.finalize().into();
                Hash::from_bytes(out)
            }
        }
    )*};
}

sha256_hasher! {
    struct TransactionId => "TransactionID",
    struct BlockHash => "BlockHash",
    struct MerkleBranchHash => "MerkleBranchHash",
    struct MuHashElementHash => "MuHashElement",
    struct MuHashFinalizeHash => "MuHashFinalize",
}

use std::fmt;
use std::hash::Hash;

use serde::{de::DeserializeOwned, Serialize};

/// Identity type of an entity.
///
/// Besides the usual map-key bounds, a key type knows how to mint ids for
/// records the server has not confirmed yet (`provisional`) and for records
/// an in-process backend creates (`sequential`). The two ranges never
/// overlap for a given sequence number.
pub trait EntityKey:
    Clone + Eq + Hash + fmt::Debug + fmt::Display + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Temporary client-side id for the `seq`-th optimistic create.
    fn provisional(seq: u64) -> Self;

    /// Authoritative-looking id for the `seq`-th server-side create.
    fn sequential(seq: u64) -> Self;
}

macro_rules! signed_key {
    ($($ty:ty),*) => {
        $(
            impl EntityKey for $ty {
                fn provisional(seq: u64) -> Self {
                    -(<$ty>::try_from(seq).unwrap_or(<$ty>::MAX))
                }

                fn sequential(seq: u64) -> Self {
                    <$ty>::try_from(seq).unwrap_or(<$ty>::MAX)
                }
            }
        )*
    };
}

macro_rules! unsigned_key {
    ($($ty:ty),*) => {
        $(
            impl EntityKey for $ty {
                fn provisional(seq: u64) -> Self {
                    <$ty>::MAX.saturating_sub(<$ty>::try_from(seq).unwrap_or(<$ty>::MAX))
                }

                fn sequential(seq: u64) -> Self {
                    <$ty>::try_from(seq).unwrap_or(<$ty>::MAX)
                }
            }
        )*
    };
}

signed_key!(i32, i64);
unsigned_key!(u32, u64);

impl EntityKey for String {
    fn provisional(seq: u64) -> Self {
        format!("tmp-{}", seq)
    }

    fn sequential(seq: u64) -> Self {
        seq.to_string()
    }
}

//! # Common Types and Traits
use core::{
    fmt::{Debug, Display},
    hash::Hash,
};

use num_traits::{FromPrimitive, PrimInt, ToPrimitive, Unsigned};

use crate::errors::{UPResult, UnipieceError};

/// A type that can be used as a piece id in encoder output.
///
/// These are constrained to be unsigned primitive integers;
/// such that the max piece id in a model is less than `T::max()`.
pub trait TokenType:
    'static
    + PrimInt
    + FromPrimitive
    + ToPrimitive
    + Unsigned
    + Hash
    + Default
    + Debug
    + Display
    + Send
    + Sync
{
}

impl<T> TokenType for T where
    T: 'static
        + PrimInt
        + FromPrimitive
        + ToPrimitive
        + Unsigned
        + Hash
        + Default
        + Debug
        + Display
        + Send
        + Sync
{
}

/// Convert a piece index into a token value.
pub fn token_from_index<T: TokenType>(index: usize) -> UPResult<T> {
    T::from_usize(index).ok_or(UnipieceError::TokenOutOfRange)
}

/// Convert a token value into a piece index.
pub fn index_from_token<T: TokenType>(token: T) -> UPResult<usize> {
    token.to_usize().ok_or(UnipieceError::TokenOutOfRange)
}

/// A pair of piece ids.
pub type Pair<T> = (T, T);

cfg_if::cfg_if! {
    if #[cfg(feature = "ahash")] {
        /// Type Alias for hash maps in this crate.
        pub type UPHashMap<K, V> = ahash::AHashMap<K, V>;

        /// Type Alias for hash sets in this crate.
        pub type UPHashSet<V> = ahash::AHashSet<V>;

    } else if #[cfg(feature = "foldhash")] {
        /// Type Alias for hash maps in this crate.
        pub type UPHashMap<K, V> = foldhash::HashMap<K, V>;

        /// Type Alias for hash sets in this crate.
        pub type UPHashSet<V> = foldhash::HashSet<V>;

    } else {
        /// Type Alias for hash maps in this crate.
        pub type UPHashMap<K, V> = std::collections::HashMap<K, V>;

        /// Type Alias for hash sets in this crate.
        pub type UPHashSet<V> = std::collections::HashSet<V>;
    }
}

/// Create a new hash map with the given capacity.
pub fn hash_map_with_capacity<K, V>(capacity: usize) -> UPHashMap<K, V> {
    UPHashMap::with_capacity_and_hasher(capacity, Default::default())
}

/// Static check that a type is `Send`.
pub fn check_is_send<S: Send>(_: &S) {}

/// Static check that a type is `Sync`.
pub fn check_is_sync<S: Sync>(_: &S) {}

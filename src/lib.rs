#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(all(test, not(feature = "std")))]
extern crate std;

mod error;

pub mod hash_table;

pub mod mix;

pub use error::CapacityError;
pub use hash_table::Entry;
pub use hash_table::HashTable;
pub use mix::hash_key;

#![cfg_attr(not(feature = "std"), no_std)]

//! Primitive types shared across the transaction pool.

#[cfg(not(feature = "std"))]
extern crate alloc;

pub use primitive_types::{H160, H256, U256};

mod address;

pub use address::{error::AddressError, Address};

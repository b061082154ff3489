//! A library implementing common utilities used throughout trex.

pub use hashbrown as hashmap;

mod mac;
pub use mac::*;

pub mod atom;

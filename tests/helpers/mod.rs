//! Test helpers module
//!
//! Temporary SQLite databases, fixture builders, token minting and a
//! document store that fails on demand.

#![allow(dead_code)]

pub mod database_helper;
pub mod directory_helper;
pub mod test_data;

pub use database_helper::*;
pub use directory_helper::*;
pub use test_data::*;

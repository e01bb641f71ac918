//! Chore tracker backend.
//!
//! A parent creates chores and assigns them to kids; kids start and
//! finish them; approval converts a chore's point value into ledger
//! entries the kid can claim or redeem for parent-defined rewards.
//!
//! The crate is layered the usual way: [`domain`] holds the business
//! rules, [`storage`] the persistence traits and their SQLite
//! implementation, and [`io`] the REST shell. [`config`] reads runtime
//! settings from the environment.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

//! # IO Module
//!
//! The thin shell around the domain: REST handlers that deserialize a
//! request, resolve the caller id, call exactly one service method and
//! map the result.

pub mod rest;

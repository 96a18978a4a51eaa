//! Loader Integration Tests
//!
//! End-to-end tests for loading raw documents into designs and extracting
//! them back: round trips, atomicity, identity strategies, hierarchy and
//! reference integrity, clipboard pruning and foreign producers.

#[path = "../common/mod.rs"]
mod common;

mod atomicity;
mod foreign;
mod identity;
mod integrity;
mod pruning;
mod round_trip;

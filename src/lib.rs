//! Timmerman constraint lookup: load the reference table once, query it per
//! (fraction count, structural filter, organ), export the result.
//!
//! The library holds no UI state; the desktop binary drives it with plain
//! arguments and renders whatever rows come back.

pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod export;

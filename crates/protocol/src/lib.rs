//! Wire types for the readaloud engine.
//!
//! This crate contains the serde-serializable types exchanged between UI
//! surfaces and the page-resident engine, plus the records persisted to the
//! key-value stores. These types represent the "protocol layer" - the shapes
//! of data as they appear on the message channel and in storage.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization and defaults
//! * 1:1 with the channel: Match the extension's `{type, data?}` message shape
//! * Stable: Changes only when the message or storage shape changes
//!
//! The engine logic built on top of these types lives in `readaloud-core`.

pub mod command;
pub mod settings;
pub mod types;

pub use command::*;
pub use settings::*;
pub use types::*;

//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the playback core crates:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! Every other core crate depends on this one for its logging conventions,
//! for the [`CoreConfig`](config::CoreConfig) that carries the host bridges,
//! and for the broadcast [`EventBus`](events::EventBus) used to report
//! catalog, metadata and playback changes to hosts.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};

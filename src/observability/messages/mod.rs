// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit it with its fields attached at the right level.
//!
//! # Organization
//!
//! * `engine` - Run lifecycle, waves and per-feature outcomes
//! * `calculator` - Calculator construction
//! * `validation` - Configuration loading and validation
//!
//! # Usage Pattern
//!
//! ```rust
//! use cim_pipeline::observability::messages::engine::WaveStarted;
//! use cim_pipeline::observability::messages::StructuredLog;
//!
//! let msg = WaveStarted {
//!     wave_index: 0,
//!     feature_count: 3,
//! };
//!
//! msg.log();
//! ```

use tracing::Span;

pub mod calculator;
pub mod engine;
pub mod validation;

/// Emit a message as a structured tracing event, or open a span carrying its fields.
pub trait StructuredLog {
    fn log(&self);

    fn span(&self, name: &str) -> Span;
}

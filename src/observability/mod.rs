// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging.
//!
//! Log lines are not written inline. Every event has a message struct under
//! `messages` so wording lives in one place and fields stay consistent:
//!
//! * `messages::engine` - Orchestrator runs, waves and feature outcomes
//! * `messages::calculator` - Strategy factory events
//! * `messages::validation` - Configuration loading and validation
//!
//! # Usage
//!
//! ```rust
//! use cim_pipeline::observability::messages::engine::FeatureReused;
//! use cim_pipeline::observability::messages::StructuredLog;
//!
//! FeatureReused { feature: "building_area" }.log();
//! ```

pub mod messages;

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod calculators; // built-in feature strategies
pub mod config;      // config + registry
pub mod engine;      // resolver, executor, reports
pub mod errors;      // error handling
pub mod observability;
pub mod services;    // in-memory service backends
pub mod traits;      // calculator and service contracts
pub mod utils;

// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
// SPDX-License-Identifier: AGPL-3.0
//! m13 Common - Shared functionality for m13 components
//!
//! This crate provides the snapshot types exchanged between the REST facade
//! and its clients, together with the logging setup shared by every binary.

/// Snapshot types describing sessions, targets, processes, threads, frames and breakpoints
pub mod types;

/// Logging setup and utilities for consistent logging across m13 components
pub mod logging;

pub use logging::*;
pub use types::*;

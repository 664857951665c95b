// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0
//! ThinkOrbit core
//!
//! Event bus, intent routing, task handling and the SSH operator shell.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain types, application services, persistence adapters
//!   and the shell/HTTP presentation surfaces

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;

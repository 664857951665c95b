// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Events, repository contracts, tasks, intents and configuration

pub mod events;
pub mod intent;
pub mod orbit_config;
pub mod repository;
pub mod task;

// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the ThinkOrbit CLI

pub mod config;
pub mod debug;
pub mod servers;
pub mod update;

pub use self::config::ConfigCommand;
pub use self::debug::DebugCommand;
pub use self::servers::ServersCommand;
pub use self::update::UpdateCommand;

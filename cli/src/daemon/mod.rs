// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Service mode
//!
//! Runs the event bus, the SSH shell servers and the optional HTTP API in
//! the foreground until Ctrl+C or SIGTERM.

pub mod client;
pub mod server;

pub use server::start_daemon;

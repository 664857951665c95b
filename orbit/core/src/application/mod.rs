// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod command_registry;
pub mod commands;
pub mod event_factory;
pub mod intent_router;
pub mod output;
pub mod services;
pub mod task_service;

// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! SSH operator shell
//!
//! - **server / factory** - named russh listeners, owned by a registry
//! - **session** - one shell per SSH channel, fed raw bytes
//! - **line_editor / completer / highlighter** - terminal line editing
//! - **status** - optional status line

pub mod completer;
pub mod factory;
pub mod highlighter;
pub mod line_editor;
pub mod properties;
pub mod server;
pub mod session;
pub mod status;

pub use factory::{ShellServerFactory, ShellServerRegistry, DEFAULT_SERVER_NAME};
pub use properties::{PasswordAuthenticator, ShellServerProperties, StaticCredentials};
pub use server::{ShellContext, ShellServer, ShellServerError};
pub use session::{SessionOutput, ShellSession};

// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! SSH Shell Server Instance
//!
//! A named SSH listener. Each accepted connection runs a russh session whose
//! handler authenticates the user, then bridges the session channel to a
//! [`ShellSession`].

use super::highlighter::ShellHighlighter;
use super::properties::{PasswordAuthenticator, ShellServerProperties};
use super::session::ShellSession;
use super::status::{DefaultStatusProvider, ShellStatusProvider};
use crate::application::command_registry::CommandRegistry;
use crate::infrastructure::metrics;
use async_trait::async_trait;
use parking_lot::Mutex;
use russh::server::{Auth, Config, Msg, Session};
use russh::{Channel, ChannelId, CryptoVec, Disconnect, MethodSet};
use russh_keys::key::PublicKey;
use russh_keys::PublicKeyBase64;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared collaborators handed to every shell session.
#[derive(Clone)]
pub struct ShellContext {
    pub registry: Arc<CommandRegistry>,
    pub highlighter: Arc<dyn ShellHighlighter>,
}

impl ShellContext {
    pub fn new(registry: Arc<CommandRegistry>, highlighter: Arc<dyn ShellHighlighter>) -> Self {
        Self { registry, highlighter }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShellServerError {
    #[error(
        "Missing SSH host key at {}. Please generate one using ssh-keygen -t rsa -f {}",
        .path.display(),
        .path.display()
    )]
    MissingHostKey { path: PathBuf },

    #[error("Failed to load SSH host key at {}: {message}", .path.display())]
    InvalidHostKey { path: PathBuf, message: String },

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

struct RunningServer {
    token: CancellationToken,
    handle: JoinHandle<()>,
    local_addr: SocketAddr,
}

pub struct ShellServer {
    name: String,
    properties: ShellServerProperties,
    context: ShellContext,
    running: AtomicBool,
    state: Mutex<Option<RunningServer>>,
    /// Serializes start and stop, which await between check and update.
    lifecycle: tokio::sync::Mutex<()>,
}

impl ShellServer {
    pub fn new(name: impl Into<String>, properties: ShellServerProperties, context: ShellContext) -> Self {
        Self {
            name: name.into(),
            properties,
            context,
            running: AtomicBool::new(false),
            state: Mutex::new(None),
            lifecycle: tokio::sync::Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &ShellServerProperties {
        &self.properties
    }

    /// Check if the server is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Address actually bound (useful when configured with port 0)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.state.lock().as_ref().map(|s| s.local_addr)
    }

    pub async fn start(&self) -> Result<(), ShellServerError> {
        let _lifecycle = self.lifecycle.lock().await;
        if self.is_running() {
            warn!("Shell server [{}] is already running", self.name);
            return Ok(());
        }

        info!(
            "Starting SSH server [{}] on {}:{}",
            self.name, self.properties.host, self.properties.port
        );

        let host_key = load_host_key(&self.properties.host_key_path)?;
        let authorized_keys = load_authorized_keys(&self.name, self.properties.authorized_keys_path.as_deref());

        let address = self.properties.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ShellServerError::Bind {
                address: address.clone(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| ShellServerError::Bind {
            address: address.clone(),
            source,
        })?;

        let config = Arc::new(Config {
            inactivity_timeout: Some(self.properties.inactivity_timeout),
            auth_rejection_time: Duration::from_secs(1),
            auth_rejection_time_initial: Some(Duration::from_secs(0)),
            keys: vec![host_key],
            ..Default::default()
        });

        let token = CancellationToken::new();
        let acceptor = Acceptor {
            server_name: self.name.clone(),
            config,
            authenticator: self.properties.authenticator.clone(),
            authorized_keys: Arc::new(authorized_keys),
            context: self.context.clone(),
            status_line: self.properties.status_line,
        };
        let handle = tokio::spawn(acceptor.run(listener, token.clone()));

        *self.state.lock() = Some(RunningServer {
            token,
            handle,
            local_addr,
        });
        self.running.store(true, Ordering::SeqCst);
        metrics::shell_server_started();
        info!("SSH server [{}] listening on {}", self.name, local_addr);
        Ok(())
    }

    pub async fn stop(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        let running = self.state.lock().take();
        let Some(running) = running else {
            warn!("Shell server [{}] is not running", self.name);
            return;
        };

        info!("Stopping SSH server [{}]", self.name);
        running.token.cancel();

        match tokio::time::timeout(STOP_TIMEOUT, running.handle).await {
            Ok(Ok(())) => info!("SSH server [{}] stopped successfully", self.name),
            Ok(Err(e)) => error!("Error stopping SSH server [{}]: {}", self.name, e),
            Err(_) => warn!(
                "SSH server [{}] did not stop within {:?}",
                self.name, STOP_TIMEOUT
            ),
        }

        self.running.store(false, Ordering::SeqCst);
        metrics::shell_server_stopped();
    }
}

fn load_host_key(path: &Path) -> Result<russh_keys::key::KeyPair, ShellServerError> {
    if !path.exists() {
        return Err(ShellServerError::MissingHostKey {
            path: path.to_path_buf(),
        });
    }
    russh_keys::load_secret_key(path, None).map_err(|e| ShellServerError::InvalidHostKey {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Parse an OpenSSH authorized_keys file into the base64 key bodies it
/// allows. A missing or unreadable file allows nothing.
fn load_authorized_keys(server: &str, path: Option<&Path>) -> HashSet<String> {
    let Some(path) = path else {
        warn!("No authorized_keys file configured for server [{}]", server);
        return HashSet::new();
    };

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to load authorized keys for server [{}] from {:?}: {}", server, path, e);
            return HashSet::new();
        }
    };

    let keys = parse_authorized_keys(&content);
    info!("Loaded {} authorized keys for server [{}]", keys.len(), server);
    keys
}

pub(crate) fn parse_authorized_keys(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            // <type> <base64> [comment]; option prefixes are not supported
            let encoded = line.split_whitespace().nth(1)?;
            match russh_keys::parse_public_key_base64(encoded) {
                Ok(key) => Some(key.public_key_base64()),
                Err(e) => {
                    warn!("Skipping unparseable authorized key: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// Accept loop state, moved into the listener task.
struct Acceptor {
    server_name: String,
    config: Arc<Config>,
    authenticator: Arc<dyn PasswordAuthenticator>,
    authorized_keys: Arc<HashSet<String>>,
    context: ShellContext,
    status_line: bool,
}

impl Acceptor {
    async fn run(self, listener: TcpListener, token: CancellationToken) {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Accept loop for [{}] cancelled", self.server_name);
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((socket, peer)) => {
                        debug!("Accepted SSH connection on [{}] from {}", self.server_name, peer);
                        let handler = ShellConnection::new(&self, peer);
                        let config = self.config.clone();
                        let server_name = self.server_name.clone();
                        let cancelled = token.child_token();
                        tokio::spawn(async move {
                            if let Err(e) = serve_connection(config, socket, handler, cancelled).await {
                                warn!("SSH connection on [{}] from {} ended with error: {:#}", server_name, peer, e);
                            }
                        });
                    }
                    Err(e) => warn!("Failed to accept SSH connection on [{}]: {}", self.server_name, e),
                }
            }
        }
    }
}

async fn serve_connection(
    config: Arc<Config>,
    socket: tokio::net::TcpStream,
    handler: ShellConnection,
    cancelled: CancellationToken,
) -> anyhow::Result<()> {
    let session = russh::server::run_stream(config, socket, handler).await?;
    let handle = session.handle();

    tokio::select! {
        result = session => result,
        _ = cancelled.cancelled() => {
            let _ = handle
                .disconnect(Disconnect::ByApplication, "server stopping".to_string(), "en".to_string())
                .await;
            Ok(())
        }
    }
}

/// Per-connection russh handler.
struct ShellConnection {
    server_name: String,
    peer: SocketAddr,
    user: Option<String>,
    authenticator: Arc<dyn PasswordAuthenticator>,
    authorized_keys: Arc<HashSet<String>>,
    context: ShellContext,
    status_line: bool,
    channels: HashMap<ChannelId, Option<ShellSession>>,
}

impl ShellConnection {
    fn new(acceptor: &Acceptor, peer: SocketAddr) -> Self {
        Self {
            server_name: acceptor.server_name.clone(),
            peer,
            user: None,
            authenticator: acceptor.authenticator.clone(),
            authorized_keys: acceptor.authorized_keys.clone(),
            context: acceptor.context.clone(),
            status_line: acceptor.status_line,
            channels: HashMap::new(),
        }
    }

    fn reject() -> Auth {
        Auth::Reject {
            proceed_with_methods: Some(MethodSet::PASSWORD | MethodSet::PUBLICKEY),
        }
    }

    fn send(session: &mut Session, channel: ChannelId, bytes: &[u8]) {
        if !bytes.is_empty() {
            let _ = session.data(channel, CryptoVec::from_slice(bytes));
        }
    }
}

#[async_trait]
impl russh::server::Handler for ShellConnection {
    type Error = anyhow::Error;

    async fn auth_password(&mut self, user: &str, password: &str) -> Result<Auth, Self::Error> {
        if self.authenticator.authenticate(user, password) {
            info!("User {} authenticated by password on [{}] from {}", user, self.server_name, self.peer);
            self.user = Some(user.to_string());
            Ok(Auth::Accept)
        } else {
            warn!("Password authentication failed for {} on [{}] from {}", user, self.server_name, self.peer);
            Ok(Self::reject())
        }
    }

    async fn auth_publickey(&mut self, user: &str, public_key: &PublicKey) -> Result<Auth, Self::Error> {
        if self.authorized_keys.contains(&public_key.public_key_base64()) {
            info!("User {} authenticated by public key on [{}] from {}", user, self.server_name, self.peer);
            self.user = Some(user.to_string());
            Ok(Auth::Accept)
        } else {
            debug!("Public key rejected for {} on [{}]", user, self.server_name);
            Ok(Self::reject())
        }
    }

    async fn channel_open_session(
        &mut self,
        channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        self.channels.insert(channel.id(), None);
        Ok(true)
    }

    #[allow(clippy::too_many_arguments)]
    async fn pty_request(
        &mut self,
        channel: ChannelId,
        term: &str,
        col_width: u32,
        row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _modes: &[(russh::Pty, u32)],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        debug!("PTY requested: term={} size={}x{}", term, col_width, row_height);
        let _ = session.channel_success(channel);
        Ok(())
    }

    async fn shell_request(&mut self, channel: ChannelId, session: &mut Session) -> Result<(), Self::Error> {
        let user = self.user.clone().unwrap_or_default();
        let status: Option<Arc<dyn ShellStatusProvider>> = if self.status_line {
            Some(Arc::new(DefaultStatusProvider::new()))
        } else {
            None
        };

        let mut shell = ShellSession::new(
            user,
            self.context.registry.clone(),
            self.context.highlighter.clone(),
            status,
        );
        let output = shell.start();
        metrics::record_shell_session(&self.server_name);

        let _ = session.channel_success(channel);
        Self::send(session, channel, &output.bytes);
        self.channels.insert(channel, Some(shell));
        Ok(())
    }

    async fn data(&mut self, channel: ChannelId, data: &[u8], session: &mut Session) -> Result<(), Self::Error> {
        let Some(Some(shell)) = self.channels.get_mut(&channel) else {
            return Ok(());
        };

        let output = shell.feed(data).await;
        Self::send(session, channel, &output.bytes);

        if output.terminated {
            self.channels.remove(&channel);
            let _ = session.eof(channel);
            let _ = session.close(channel);
        }
        Ok(())
    }

    async fn channel_eof(&mut self, channel: ChannelId, session: &mut Session) -> Result<(), Self::Error> {
        if let Some(Some(mut shell)) = self.channels.remove(&channel) {
            shell.terminate();
        }
        let _ = session.close(channel);
        Ok(())
    }

    async fn channel_close(&mut self, channel: ChannelId, _session: &mut Session) -> Result<(), Self::Error> {
        if let Some(Some(mut shell)) = self.channels.remove(&channel) {
            shell.terminate();
        }
        Ok(())
    }
}

// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! HTTP client for the shell server management API

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use thinkorbit_core::presentation::api::ServerStatus;

#[derive(Debug, Clone, Serialize)]
pub struct CreateServerRequest {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct DaemonClient {
    client: Client,
    base_url: String,
}

impl DaemonClient {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url(host, port),
        })
    }

    pub async fn list_servers(&self) -> Result<BTreeMap<String, ServerStatus>> {
        let response = self
            .client
            .get(format!("{}/api/shell-servers", self.base_url))
            .send()
            .await
            .context("Failed to reach the ThinkOrbit API")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to list servers: {}", error_text);
        }

        response
            .json()
            .await
            .context("Failed to parse server list")
    }

    pub async fn create_server(&self, request: &CreateServerRequest) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/api/shell-servers", self.base_url))
            .query(request)
            .send()
            .await
            .context("Failed to reach the ThinkOrbit API")?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("{}", body);
        }
        Ok(body)
    }

    pub async fn stop_server(&self, name: &str) -> Result<String> {
        let response = self
            .client
            .delete(format!("{}/api/shell-servers/{}", self.base_url, name))
            .send()
            .await
            .context("Failed to reach the ThinkOrbit API")?;

        match response.status() {
            StatusCode::NOT_FOUND => anyhow::bail!("Server {} not found", name),
            status if status.is_success() => Ok(response.text().await.unwrap_or_default()),
            status => {
                let error_text = response.text().await.unwrap_or_default();
                anyhow::bail!("Failed to stop server ({}): {}", status, error_text)
            }
        }
    }
}

fn base_url(host: &str, port: u16) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}:{}", host, port)
    } else {
        format!("http://{}:{}", host, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        assert_eq!(base_url("127.0.0.1", 8080), "http://127.0.0.1:8080");
        assert_eq!(base_url("https://orbit.local", 443), "https://orbit.local:443");
    }
}

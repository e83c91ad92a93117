//! Access token resolution
//!
//! inv365 never runs a sign-in flow of its own. It borrows a token from the
//! operator's existing session: an explicit `--token`, the
//! `INV365_ACCESS_TOKEN` environment variable, or the Azure CLI.

use crate::error::{Inv365Error, Result};
use tokio::process::Command;

pub const TOKEN_ENV_VAR: &str = "INV365_ACCESS_TOKEN";

/// Graph read scopes the signed-in account needs for a full report
pub const REQUIRED_SCOPES: &[&str] = &[
    "DeviceManagementServiceConfig.Read.All",
    "DeviceManagementManagedDevices.Read.All",
    "Device.Read.All",
    "User.Read.All",
];

/// Where the bearer token came from, for the run banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Flag,
    Environment,
    AzureCli,
}

impl TokenSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSource::Flag => "--token",
            TokenSource::Environment => TOKEN_ENV_VAR,
            TokenSource::AzureCli => "Azure CLI session",
        }
    }
}

/// Resolve the bearer token for Graph calls
pub async fn resolve_access_token(explicit: Option<&str>) -> Result<(String, TokenSource)> {
    if let Some(token) = non_empty(explicit) {
        return Ok((token.to_string(), TokenSource::Flag));
    }

    if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
        if let Some(token) = non_empty(Some(&token)) {
            return Ok((token.to_string(), TokenSource::Environment));
        }
    }

    let token = azure_cli_token().await?;
    Ok((token, TokenSource::AzureCli))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Ask the Azure CLI for a Graph token from its cached sign-in
async fn azure_cli_token() -> Result<String> {
    let output = Command::new("az")
        .args([
            "account",
            "get-access-token",
            "--resource-type",
            "ms-graph",
            "--query",
            "accessToken",
            "--output",
            "tsv",
        ])
        .output()
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, "az CLI not available");
            Inv365Error::TokenNotFound
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Inv365Error::AuthError(format!(
            "az account get-access-token failed: {}",
            stderr.trim()
        )));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(Inv365Error::TokenNotFound);
    }

    Ok(token)
}

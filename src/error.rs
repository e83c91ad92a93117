use thiserror::Error;

#[derive(Error, Debug)]
pub enum Inv365Error {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Graph API error: {0}")]
    GraphApiError(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error(
        "No access token available. Pass --token, set INV365_ACCESS_TOKEN, or sign in with 'az login'"
    )]
    TokenNotFound,
}

pub type Result<T> = std::result::Result<T, Inv365Error>;

pub use Inv365Error as Error;

/// Parse Graph API error response and provide helpful context
pub fn enhance_graph_error(error_response: &str) -> String {
    if let Ok(error_json) = serde_json::from_str::<serde_json::Value>(error_response) {
        if let Some(error_obj) = error_json.get("error") {
            let code = error_obj
                .get("code")
                .and_then(|c| c.as_str())
                .unwrap_or("Unknown");
            let message = error_obj
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("No message");

            let hint = match code {
                "Unauthorized" | "InvalidAuthenticationToken" => {
                    "\n💡 Hint: The access token is missing or expired. Run 'az login' again or pass a fresh --token."
                }
                "Forbidden" | "Authorization_RequestDenied" | "InsufficientPrivileges" => {
                    "\n💡 Hint: The signed-in account needs DeviceManagementServiceConfig.Read.All, DeviceManagementManagedDevices.Read.All and Device.Read.All."
                }
                "BadRequest" if message.contains("Resource not found for the segment") => {
                    "\n💡 Hint: This endpoint may only exist on the beta Graph endpoint. Check graph_base_url."
                }
                "NotFound" | "ResourceNotFound" => {
                    "\n💡 Hint: The requested resource doesn't exist. Check IDs and endpoint paths."
                }
                "TooManyRequests" => {
                    "\n💡 Hint: API rate limit exceeded. Wait a moment and run the report again."
                }
                _ => "",
            };

            return format!("{}: {}{}", code, message, hint);
        }
    }

    error_response.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enhance_graph_error_with_hint() {
        let body = r#"{"error":{"code":"InvalidAuthenticationToken","message":"Access token is empty."}}"#;
        let enhanced = enhance_graph_error(body);
        assert!(enhanced.starts_with("InvalidAuthenticationToken: Access token is empty."));
        assert!(enhanced.contains("az login"));
    }

    #[test]
    fn test_enhance_graph_error_unknown_code() {
        let body = r#"{"error":{"code":"Weird","message":"Something odd"}}"#;
        assert_eq!(enhance_graph_error(body), "Weird: Something odd");
    }

    #[test]
    fn test_enhance_graph_error_raw_text() {
        assert_eq!(enhance_graph_error("Bad Gateway"), "Bad Gateway");
    }
}

//! Client construction and error mapping for the OpenAI-compatible service.

use crate::config::GenerationSettings;
use crate::error::{Result, VidaskError};
use async_openai::error::OpenAIError;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client for the configured endpoint and project.
///
/// The API key is read from `OPENAI_API_KEY`.
pub fn create_client(settings: &GenerationSettings, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| VidaskError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let config = OpenAIConfig::new()
        .with_api_base(settings.endpoint.trim_end_matches('/'))
        .with_project_id(&settings.project_id);

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Map a client error, treating connection problems and overload as transient.
pub fn map_error(err: OpenAIError, otherwise: fn(String) -> VidaskError) -> VidaskError {
    match err {
        OpenAIError::Reqwest(e) => VidaskError::TransientNetwork(e.to_string()),
        OpenAIError::ApiError(api) => {
            let kind = api.r#type.as_deref().unwrap_or_default();
            let code = api.code.as_deref().unwrap_or_default();
            if kind.contains("server_error") || code.contains("rate_limit") {
                VidaskError::TransientNetwork(api.message)
            } else {
                otherwise(api.message)
            }
        }
        other => otherwise(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::error::ApiError;

    fn api_error(kind: Option<&str>, code: Option<&str>) -> OpenAIError {
        OpenAIError::ApiError(ApiError {
            message: "boom".to_string(),
            r#type: kind.map(str::to_string),
            param: None,
            code: code.map(str::to_string),
        })
    }

    #[test]
    fn test_map_error_classifies_overload_as_transient() {
        let err = map_error(api_error(Some("server_error"), None), VidaskError::Generation);
        assert!(err.is_transient());

        let err = map_error(api_error(None, Some("rate_limit_exceeded")), VidaskError::Embedding);
        assert!(err.is_transient());
    }

    #[test]
    fn test_map_error_falls_back() {
        let err = map_error(
            api_error(Some("invalid_request_error"), None),
            VidaskError::Generation,
        );
        assert!(matches!(err, VidaskError::Generation(msg) if msg == "boom"));
    }

    #[test]
    fn test_create_client() {
        let settings = GenerationSettings {
            project_id: "proj".to_string(),
            ..Default::default()
        };
        assert!(create_client(&settings, Duration::from_secs(5)).is_ok());
    }
}

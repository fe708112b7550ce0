//! Pre-flight checks before starting a session or server.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, VidaskError};
use std::process::Command;

/// Run pre-flight checks for processing videos and answering questions.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(settings: &Settings) -> Result<()> {
    settings.validate()?;
    check_api_key()?;
    check_tool(&settings.transcript.ytdlp_path)?;
    Ok(())
}

/// Check if the API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(VidaskError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(VidaskError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check if an external tool is available.
pub(crate) fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(VidaskError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(VidaskError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(VidaskError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool() {
        let err = check_tool("vidask-no-such-tool").unwrap_err();
        assert!(matches!(err, VidaskError::ToolNotFound(_)));
    }

    #[test]
    fn test_unconfigured_settings_fail() {
        // project_id is empty by default
        let err = check(&Settings::default()).unwrap_err();
        assert!(matches!(err, VidaskError::Config(_)));
    }
}

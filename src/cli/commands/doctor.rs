//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::{Prompts, Settings};
use console::style;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Vidask Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    let mut section = |title: &str, results: Vec<CheckResult>| {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    };

    section(
        "External Tools",
        vec![check_tool(&settings.transcript.ytdlp_path, install_hint_ytdlp())],
    );
    section("API Configuration", vec![check_openai_api_key()]);
    section("Model Service", check_service(settings));
    section("Prompts", vec![check_prompts(settings)]);
    section("Configuration", vec![check_config_file()]);

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Vidask.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Vidask is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, hint: &str) -> CheckResult {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();

            let version_display = if version.chars().count() > 50 {
                format!("{}...", version.chars().take(50).collect::<String>())
            } else {
                version
            };

            CheckResult::ok(name, &version_display)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, "not found", hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check if the API key is configured.
fn check_openai_api_key() -> CheckResult {
    api_key_result(std::env::var("OPENAI_API_KEY").ok().as_deref())
}

fn api_key_result(key: Option<&str>) -> CheckResult {
    match key {
        Some(key) if key.starts_with("sk-") && key.len() > 20 => {
            let masked = format!("{}...{}", &key[..7], &key[key.len() - 4..]);
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", masked))
        }
        Some("") => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Some(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Fine for OpenAI-compatible services that use their own key format",
        ),
        None => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// Check endpoint, project and model settings.
fn check_service(settings: &Settings) -> Vec<CheckResult> {
    let hint = "Set it in the config file (vidask config edit)";
    let required = [
        ("Endpoint", "generation.endpoint", &settings.generation.endpoint),
        ("Project", "generation.project_id", &settings.generation.project_id),
        ("Generation model", "generation.model", &settings.generation.model),
        ("Embedding model", "embedding.model", &settings.embedding.model),
    ];

    let mut results: Vec<CheckResult> = required
        .into_iter()
        .map(|(name, key, value)| {
            if value.trim().is_empty() {
                CheckResult::error(name, &format!("{} is not set", key), hint)
            } else {
                CheckResult::ok(name, value)
            }
        })
        .collect();

    if let Err(e) = settings.validate() {
        if !results.iter().any(|r| r.status == CheckStatus::Error) {
            results.push(CheckResult::error("Settings", &e.to_string(), hint));
        }
    }

    results
}

/// Check that prompt templates load and carry their placeholders.
fn check_prompts(settings: &Settings) -> CheckResult {
    let loaded = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )
    .and_then(|prompts| prompts.validate());

    match (loaded, &settings.prompts.custom_dir) {
        (Ok(()), Some(dir)) => CheckResult::ok("Templates", &format!("custom ({})", dir)),
        (Ok(()), None) => CheckResult::ok("Templates", "built-in"),
        (Err(e), _) => CheckResult::error(
            "Templates",
            &e.to_string(),
            "Summary needs {transcript}; QA needs {context} and {question}",
        ),
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: vidask config edit",
        )
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

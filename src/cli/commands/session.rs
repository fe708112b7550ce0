//! Interactive session command.

use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::session::Session;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// A line typed at the session prompt.
#[derive(Debug, PartialEq)]
enum Input<'a> {
    Empty,
    Exit,
    Help,
    Status,
    Process(&'a str),
    Ask(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }

    let lower = line.to_ascii_lowercase();
    match lower.as_str() {
        "exit" | "quit" => return Input::Exit,
        "help" => return Input::Help,
        "status" => return Input::Status,
        "process" => return Input::Process(""),
        _ => {}
    }

    if lower.starts_with("process ") {
        return Input::Process(line["process ".len()..].trim());
    }

    // A pasted link is processed; anything else is a question.
    if !line.contains(char::is_whitespace)
        && (lower.contains("youtube.com/") || lower.contains("youtu.be/"))
    {
        return Input::Process(line);
    }

    Input::Ask(line)
}

/// Run the interactive session command.
pub async fn run_session(url: Option<String>, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(&settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vidask doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let session = Session::new();

    println!("\n{}", style("Vidask Session").bold().cyan());
    println!(
        "{}\n",
        style("Paste a YouTube URL to process it, then ask questions. Type 'help' for commands.")
            .dim()
    );

    if let Some(url) = url {
        process(&orchestrator, &session, &url).await;
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Exit => {
                Output::info("Goodbye!");
                break;
            }
            Input::Help => print_help(),
            Input::Status => match session.active().await {
                Some(active) => {
                    Output::kv("Video", active.video_id.as_str());
                    if let Some(title) = &active.title {
                        Output::kv("Title", title);
                    }
                    Output::kv("Chunks", &active.index.len().to_string());
                    Output::kv("Processed", &active.processed_at.to_rfc3339());
                }
                None => Output::info("No video processed yet."),
            },
            Input::Process(url) => process(&orchestrator, &session, url).await,
            Input::Ask(question) => {
                let spinner = Output::spinner("Thinking...");
                let display = orchestrator.ask_for_display(&session, question).await;
                spinner.finish_and_clear();

                if !display.answered {
                    Output::warning(&display.reply);
                    continue;
                }

                println!("\n{} {}\n", style("Vidask:").cyan().bold(), display.reply);
                if !display.sources.is_empty() {
                    println!("{}", style("Sources").dim());
                    Output::sources(&display.sources);
                    println!();
                }
            }
        }
    }

    Ok(())
}

async fn process(orchestrator: &Orchestrator, session: &Session, url: &str) {
    let spinner = Output::spinner("Processing video...");
    let display = orchestrator.process_for_display(session, url).await;
    spinner.finish_and_clear();

    if !display.processed {
        Output::warning(&display.status);
        return;
    }

    Output::success(&display.status);
    if !display.summary.is_empty() {
        println!("\n{}", style("Summary").bold());
        println!("{}\n", display.summary);
    }
}

fn print_help() {
    Output::header("Commands");
    Output::kv("process <url>", "Process a YouTube video (or paste its URL)");
    Output::kv("status", "Show the active video");
    Output::kv("exit", "Leave the session");
    Output::kv("<anything else>", "Ask a question about the active video");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("  "), Input::Empty);
        assert_eq!(parse_input("QUIT"), Input::Exit);
        assert_eq!(parse_input("status"), Input::Status);
        assert_eq!(
            parse_input("process dQw4w9WgXcQ"),
            Input::Process("dQw4w9WgXcQ")
        );
        assert_eq!(parse_input("process"), Input::Process(""));
        assert_eq!(
            parse_input("Process https://youtu.be/dQw4w9WgXcQ"),
            Input::Process("https://youtu.be/dQw4w9WgXcQ")
        );
        assert_eq!(
            parse_input("PROCESS   dQw4w9WgXcQ "),
            Input::Process("dQw4w9WgXcQ")
        );
        assert_eq!(
            parse_input("https://youtu.be/dQw4w9WgXcQ"),
            Input::Process("https://youtu.be/dQw4w9WgXcQ")
        );
        assert_eq!(parse_input("Explanation"), Input::Ask("Explanation"));
        assert_eq!(
            parse_input("What does youtube.com/ host?"),
            Input::Ask("What does youtube.com/ host?")
        );
    }
}

//! Vidask - Ask questions about YouTube videos
//!
//! Fetches a video's captions, splits them into overlapping chunks, indexes the chunks by
//! embedding, and answers questions with a language model conditioned on the nearest chunks.
//!
//! # Architecture
//!
//! - `video` - YouTube URL parsing
//! - `transcript` - Caption retrieval
//! - `chunking` - Recursive character chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - In-memory cosine index
//! - `generation` - Text generation
//! - `rag` - Context retrieval and answers
//! - `session` - Per-user session state
//! - `orchestrator` - Process and ask operations
//!
//! # Example
//!
//! ```rust,no_run
//! use vidask::config::Settings;
//! use vidask::orchestrator::Orchestrator;
//! use vidask::session::Session;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!     let session = Session::new();
//!
//!     let outcome = orchestrator.process(&session, "https://youtu.be/dQw4w9WgXcQ").await?;
//!     println!("Indexed {} chunks", outcome.chunks_indexed);
//!
//!     let answer = orchestrator.ask(&session, "What is the song about?").await?;
//!     println!("{}", answer.text);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod retry;
pub mod session;
pub mod transcript;
pub mod vector_store;
pub mod video;

#[cfg(test)]
mod testing;

pub use error::{Result, VidaskError};

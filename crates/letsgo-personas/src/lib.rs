//! # letsgo Personas
//!
//! Persona-flavored replies from a hosted chat-completion API.
//!
//! ## Personas
//!
//! - 🔍 Johny: short answers, links and citations stripped (`/dive`)
//! - 🧠 Tony: long-form reasoning with meta-commentary removed (`/deep`)
//!
//! A persona never fails from the caller's point of view: every outcome,
//! including a missing API key or a broken response, comes back as the reply
//! string and is recorded in the session log before being returned.

pub mod client;
pub mod persona;
pub mod transform;

pub use client::{ChatBackend, ChatClient, ChatMessage, ChatRequest, DEFAULT_API_BASE};
pub use persona::{Persona, PersonaKind, PersonaProfile};

use thiserror::Error;

/// Persona errors
#[derive(Error, Debug)]
pub enum PersonaError {
    #[error("PERPLEXITY_API_KEY not set")]
    MissingCredential,

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, PersonaError>;

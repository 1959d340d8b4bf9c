//! Content generation gateway for a primary-school Chinese learning app
//!
//! Produces reading comprehension articles, classical poems, character
//! breakdowns, picture-writing tasks and composition feedback from a language
//! model, over either the managed Gemini API or an OpenAI-compatible proxy,
//! and normalizes whatever the model returns into strict typed records.

pub mod ai;
pub mod config;
pub mod error;
pub mod gateway;
pub mod image;
pub mod models;
pub mod normalize;
pub mod prompts;
pub mod schema;

pub use error::{Error, Result};
pub use gateway::Gateway;

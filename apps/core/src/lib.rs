//! Psychiatrist chatbot core.
//!
//! Classifies free-text messages into a fixed intent taxonomy with a
//! pretrained bag-of-words model and answers with a templated reply.

pub mod artifacts;
pub mod brain;
pub mod chatbot;
pub mod config;
pub mod error;
pub mod services;

pub use chatbot::{Chatbot, Turn};
pub use config::AppConfig;
pub use error::AppError;

#[cfg(test)]
mod tests;

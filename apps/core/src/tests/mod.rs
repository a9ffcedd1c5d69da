//! Test Module
//!
//! Cross-module test suite for the chatbot core.
//!
//! ## Test Categories
//! - `brain_tests`: Vectorization, dense-network classification, response selection
//! - `services_tests`: Wikipedia and translation clients against mock HTTP servers
//! - `integration_tests`: Full conversations from artifacts on disk
//! - `property_tests`: Pipeline invariants over generated inputs
//! - `config_tests`: Environment-driven configuration

pub mod integration_tests;

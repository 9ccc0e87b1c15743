//! Core domain types and logic.

pub mod bar;
pub mod evaluator;
pub mod aggregator;
pub mod run_config;
pub mod config_validation;
pub mod error;

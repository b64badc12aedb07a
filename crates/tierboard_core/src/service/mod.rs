//! Board use-case services.
//!
//! # Responsibility
//! - Orchestrate engine, repository and notifier into presentation-facing
//!   APIs.
//! - Keep hosts decoupled from storage and engine internals.

pub mod board_service;
pub mod notifier;

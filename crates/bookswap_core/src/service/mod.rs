//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep HTTP/controller layers decoupled from storage details.

pub mod book_service;
pub mod loan_service;
pub mod user_profile_service;

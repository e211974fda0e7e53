//! Core use-case services.
//!
//! # Responsibility
//! - Thread flat allocation and access rules through store operations.
//! - Keep UI callers decoupled from storage details.

pub mod directory_service;

//! Core infrastructure for hubkit.
//!
//! This crate provides the pieces shared by the parser, the auth helpers and
//! the `task-params` tool:
//! - Byte spans for source edits
//! - Text position utilities
//! - The unified error type and its exit codes

pub mod error;
pub mod patch;
pub mod text;

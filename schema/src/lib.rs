//! Schema definitions for Altair
//!
//! This crate contains shared data structures and schemas used across
//! the Altair ecosystem. All types here implement JSON Schema
//! generation for external consumption.

pub mod launch;

pub use launch::{CommandSpec, LaunchExit};

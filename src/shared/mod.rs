//! Shared utilities used across handlers

pub mod text;

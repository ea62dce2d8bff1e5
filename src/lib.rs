//! Siteops - terminal admin console for page-hosting service operations
//!
//! This library module exports the screens' domain state for integration
//! tests; the TUI shell lives in the binary.

// Allow dead code in the library - some helpers are only used by the binary
#![allow(dead_code)]

pub mod api;
pub mod config;
pub mod invalidation;
pub mod logview;
pub mod register;

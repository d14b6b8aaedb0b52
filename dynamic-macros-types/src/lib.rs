//! # Dynamic Macros Types
//!
//! Fundamental type definitions shared by the dynamic macro engine and host-side tooling.
//!
//! ## Modules
//!
//! - [`key`] - Keys as stored in macros: modifier flags plus a keycode
//! - [`step`] - Macro step opcodes and the decoded step representation
//! - [`protocol`] - Configuration channel command names

#![no_std]

pub mod key;
pub mod protocol;
pub mod step;

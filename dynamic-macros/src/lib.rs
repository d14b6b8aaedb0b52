//! Dynamic keyboard macros.
//!
//! Macros live as a byte-encoded program in a region of persistent memory.
//! The engine keeps a directory from macro id to program offset, plays a macro
//! when its key is pressed, and serves the raw region over the configuration
//! channel so host software can replace it.
//!
//! The host keyboard firmware drives everything through [`host::MacroPlugin`]:
//!
//! ```rust,ignore
//! let config = DynamicMacrosConfig::default();
//! let mut macros = DynamicMacros::new(eeprom, config, embassy_time::Delay, rng)?;
//!
//! // For every physical key transition
//! macros.on_key_event(&event, &mut host);
//! // Before every report
//! macros.before_report(&mut host);
//! // For every line received on the configuration channel
//! focus::process_line(&mut macros, line, &mut host, &mut reply)?;
//! ```
//!
//! ## Feature flags
#![doc = document_features::document_features!()]
#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod config;
pub mod decoder;
pub mod directory;
mod dynamic_macros;
pub mod error;
pub mod event;
pub mod focus;
pub mod host;
pub mod player;
pub mod storage;
pub mod tracker;

pub use dynamic_macros::DynamicMacros;
pub use dynamic_macros_types as types;

/// Number of macros the directory can address.
pub const MAX_MACROS: usize = 63;

/// Number of macro keys that can be held at the same time.
pub const MAX_ACTIVE_MACRO_KEYS: usize = 8;

/// Default size of the macro storage region in bytes.
pub const MACRO_SPACE_SIZE: u16 = 256;

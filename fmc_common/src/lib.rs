//! FMC Common Library
//!
//! Shared constants, packed record codecs, status/parameter types and
//! configuration loading for all FMC workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Axis counts, record sizes and field widths
//! - [`status`] - Machine-status snapshot, axis flags and derived state types
//! - [`params`] - Device-parameter record
//! - [`codec`] - Byte-exact encoders/decoders for the controller records
//! - [`error`] - Error taxonomy shared across crates
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use fmc_common::prelude::*;
//!
//! let bytes = vec![0u8; STATUS_RECORD_SIZE];
//! let status = decode_status(&bytes).unwrap();
//! assert_eq!(status.run_mode, RunMode::Unknown(0));
//! ```

pub mod codec;
pub mod config;
pub mod consts;
pub mod error;
pub mod params;
pub mod prelude;
pub mod status;

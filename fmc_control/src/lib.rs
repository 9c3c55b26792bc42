//! # FMC Control Library
//!
//! Command/status protocol core for FMC4030-class 3-axis controllers.
//! Turns motion intents into validated command frames, interprets the
//! controller's status snapshot, and drives the auxiliary sub-protocols
//! (digital I/O, RS-485 register access, resident script files).
//!
//! ## Layers
//!
//! 1. **State**: per-axis state derived from status bits, command gating
//! 2. **Command**: pure builders producing [`command::MotionCommand`]s
//! 3. **Sub-protocols**: [`subbus`], [`io`], [`files`]
//! 4. **Session**: [`session::DeviceSession`] caches snapshots per device
//!    and submits frames through a [`transport::Transport`]
//!
//! No kinematics run here: the controller plans trajectories, this crate
//! only specifies and checks them.
//!
//! ```rust
//! use fmc_control::prelude::*;
//!
//! let mut sim = SimTransport::new();
//! sim.add_device(0, &MachineStatus::default()).unwrap();
//!
//! let mut session = DeviceSession::with_defaults(sim);
//! session.poll_status(0).unwrap();
//! session
//!     .jog(0, AxisSelection::X, JogParams {
//!         target: 10.0,
//!         speed: 20.0,
//!         acc: 100.0,
//!         dec: 100.0,
//!         mode: JogMode::Relative,
//!     })
//!     .unwrap();
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod files;
pub mod io;
pub mod prelude;
pub mod session;
pub mod state;
pub mod subbus;
pub mod transport;

pub use error::{Error, Result};

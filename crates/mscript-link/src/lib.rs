//! mscript-link: blocking byte links to MethodSCRIPT instruments
//!
//! This crate provides the [`Link`] trait the protocol engine talks through, with
//! feature-gated backends. The default build enables a scripted `mock` backend so
//! that the engine can be exercised on any host without an instrument attached.

mod types;
pub use types::{LinkSettings, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT, LINE_TERMINATOR};

mod error;
pub use error::{LinkError, Result};

mod traits;
pub use traits::Link;

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use mock::MockLink;

#[cfg(feature = "serial")]
mod serial;

#[cfg(feature = "serial")]
pub use serial::SerialLink;

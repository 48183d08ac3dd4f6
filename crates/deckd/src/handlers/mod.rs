//! Built-in key handlers.
//!
//! Each module exposes a `build` factory with the signature the registry
//! expects. Handlers that poll follow the cooperative loop convention:
//! render, sleep one interval, re-check the stop flag.

pub mod brightness;
pub mod clock;
pub mod label;
pub mod page;
pub mod uptime;

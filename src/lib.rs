//! kpkg library exports.
//!
//! The binary is a thin clap front-end; everything it calls lives here so
//! integration tests can exercise it directly.

pub mod artifact;
pub mod commands;
pub mod config;
pub mod distro;
pub mod kconfig;
pub mod preflight;
pub mod process;
pub mod remote;
pub mod request;

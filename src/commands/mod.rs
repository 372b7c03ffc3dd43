//! CLI command handlers.
//!
//! Each submodule handles one subcommand:
//! - `build` - run a kernel package build
//! - `clean` - remove transient packaging state
//! - `kernel` - pass arguments through to the kernel's make
//! - `preflight` - check host tool availability
//! - `show` - display information

pub mod build;
pub mod clean;
pub mod kernel;
pub mod preflight;
pub mod show;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use kernel::cmd_kernel;
pub use preflight::cmd_preflight;
pub use show::cmd_show;

//! Kernel pass-through command - forwards arguments to the kernel's make.

use anyhow::Result;
use std::path::Path;

use crate::process::Cmd;

/// Run `make -C <kernel_src> <args...>` with inherited stdio. Returns the
/// make exit code.
pub fn cmd_kernel(kernel_src: &Path, args: &[String]) -> Result<i32> {
    let status = Cmd::new("make")
        .args(["-C", &kernel_src.to_string_lossy()])
        .args(args)
        .allow_fail()
        .run_interactive()?;
    Ok(status.code().unwrap_or(-1))
}

//! Host platform utility functions

use std::path::PathBuf;

/// Name of the environment variable pointing at the software root.
pub const SW_ROOT_ENV_VAR: &str = "NAV_SW_ROOT";

/// Get the software root directory.
///
/// This is the value of `NAV_SW_ROOT` if it is set, otherwise the current
/// working directory.
pub fn get_sw_root() -> std::io::Result<PathBuf> {
    match std::env::var_os(SW_ROOT_ENV_VAR) {
        Some(p) => Ok(PathBuf::from(p)),
        None => std::env::current_dir()
    }
}

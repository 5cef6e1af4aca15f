//! User interface module - terminal output for resolved versions.
//!
//! - `formatter` - Pure formatting functions
//! - This module - Printing to the terminal

use crate::resolver::Resolution;

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{display_error, format_explanation};

/// Print the resolved version on its own line to stdout.
pub fn print_version(resolution: &Resolution) {
    println!("{}", resolution.version);
}

/// Print the explanation of a resolution to stdout.
pub fn print_explanation(resolution: &Resolution) {
    print!("{}", format_explanation(resolution));
}

//! Subcommands: closure, refs.

pub mod closure;
pub mod refs;

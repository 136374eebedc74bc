//! Handlers for the subcommands other than `build`.

pub mod clean;
pub mod doctor;
pub mod status;

//! CLI library components for the psi command.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;

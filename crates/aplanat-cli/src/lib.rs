//! aplanat-cli: command line entry points that build reports from the
//! ready-made aplanat components.
pub mod commands;
pub mod config;

//! yamlog - crash-durable, size-bounded event log for YAM Launcher
//!
//! The logger mirrors every entry to the console immediately and persists it
//! through a single writer thread that rotates the file by size and entry count.

pub mod cli;
pub mod config;
pub mod logging;

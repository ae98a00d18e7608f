//! Small cli for keeping a GitHub contribution streak alive. Counts today's contributions in
//! your own timezone, works out the streak and emails either a celebration or a reminder.
//!

pub mod app;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod report;
pub mod source;
pub mod utils;

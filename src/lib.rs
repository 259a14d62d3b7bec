pub use crate::errors::{Result, TestatorError};

pub mod catalog;
pub mod cli;
pub mod command;
pub mod config;
pub mod errors;
pub mod harness;
pub mod report;
pub mod runner;
pub mod tally;
pub mod verify;

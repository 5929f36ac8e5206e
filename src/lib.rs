#![allow(unused_assignments)] // thiserror/miette proc macros trigger false positives

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod instance;
pub mod inventory;
pub mod logging;
pub mod paths;
pub mod poll;
pub mod probe;
pub mod readiness;

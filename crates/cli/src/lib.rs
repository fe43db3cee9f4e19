//! Argument parsing and terminal rendering for the `gobble` binary.
pub mod args;
pub mod cook;
pub mod render;

//! Core library: inventory classification, receipt review, recipe flows, session.

pub mod config;
pub mod cooking;
pub mod inventory;
pub mod pipeline;
pub mod queue;
pub mod recipes;
pub mod review;
pub mod session;

//! Scenario-based tests for orchid

mod failure_handling;
mod helpers;
mod live_follow;
mod log_resolution;
mod success_chain;

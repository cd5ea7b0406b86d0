// src/lib.rs — Library root for worklog

pub mod api;
pub mod auth;
pub mod cli;
pub mod infra;
pub mod integrations;
pub mod session;
pub mod util;

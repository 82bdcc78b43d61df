//! Spreadsheet translation job workflow
//!
//! This library provides the job starter and job status reader behind the
//! translation API, the job record store and workflow trigger they sit on,
//! and the client-side session that uploads a spreadsheet and polls the job
//! until it completes or fails.

pub mod app_state;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

// Shared data-access layer for the resource catalog

pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod lifecycle;
pub mod models;
pub mod search;
pub mod telemetry;

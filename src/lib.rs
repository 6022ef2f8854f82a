pub mod api;
pub mod app;
pub mod bands;
pub mod config;
pub mod events;
pub mod location;
pub mod logging;
pub mod models;
pub mod ui;

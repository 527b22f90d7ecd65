// Re-export all public modules so they can be used from main.rs
pub mod config;
pub mod error;
pub mod logging;
pub mod scene;
pub mod ui;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

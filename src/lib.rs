pub mod app;
pub mod error;
pub mod logging;
pub mod publish;
pub mod run_config;
pub mod service;
pub mod settings;
pub mod tool;
pub mod workspace;

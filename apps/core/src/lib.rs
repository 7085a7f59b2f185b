pub mod activation;
pub mod cache;
pub mod config;
pub mod contract;
pub mod core_service;
pub mod discovery;
pub mod logging;
pub mod model;
pub mod process;
pub mod runtime;
pub mod search;
pub mod tab_provider;
pub mod transport;
pub mod window_provider;

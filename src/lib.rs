pub mod config;
pub mod constants;
pub mod core;
pub mod http;
pub mod stubs;

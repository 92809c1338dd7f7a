// Tsubame image transform service library

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod imaging;
pub mod logging;
pub mod server;
pub mod watermark;

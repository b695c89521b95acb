pub mod blacklist;
pub mod cli;
pub mod config;
pub mod dns;
pub mod enumeration;
pub mod errors;
pub mod http;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod utils;

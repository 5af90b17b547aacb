pub mod activity;
pub mod cleaner;
pub mod cli;
pub mod config;
pub mod directories;
pub mod error;
pub mod history;
pub mod mcp;
pub mod model;
pub mod notify;
pub mod output;
pub mod safety;
pub mod scanner;
pub mod service;
pub mod store;
pub mod template;
pub mod utils;

pub use error::{Error, Result, ValidationError};

pub mod cask;
pub mod commands;
pub mod discovery;
pub mod http;
pub mod lint;
pub mod runtime;

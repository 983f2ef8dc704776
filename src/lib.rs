//! Statik - static file HTTP server
//!
//! Serves files below a document root, one GET request per connection.

pub mod config;
pub mod http;
pub mod root;
pub mod server;

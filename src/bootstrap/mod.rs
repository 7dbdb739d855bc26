//! Startup helpers run once before the server loop.

pub mod logger;

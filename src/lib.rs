//! mcserver-control - Event-driven automation for line-console game servers.

pub mod addons;
pub mod config;
pub mod console;
pub mod context;
pub mod display;
pub mod event;
pub mod handler;
pub mod observer;
pub mod player;
pub mod scheduler;
pub mod server;

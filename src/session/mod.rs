//! Capture session lifecycle

pub mod dispatcher;
pub mod manager;

pub use dispatcher::Dispatcher;
pub use manager::SessionManager;

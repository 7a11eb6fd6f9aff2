// Adapters layer: concrete implementations for the STK engine (Connect socket, process launcher).

pub mod connect;
pub mod launcher;

pub use connect::{ConnectClient, ConnectRoot};
pub use launcher::LaunchedApplication;

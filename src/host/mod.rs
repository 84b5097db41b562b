//! Stdio JSON front end for embedding chime in another process.

pub mod contract;
pub mod handler;
pub mod stdio;

pub use contract::{Command, FiredEvent, Request, Response, Status};
pub use handler::HostHandler;
pub use stdio::{run_bridge, run_stdio_bridge};

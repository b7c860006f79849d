//! Route API
//!
//! HTTP/JSON front end for the route synchronizer.

pub mod handler;
pub mod server;
pub mod validation;

pub use handler::{handle_request, ApiState};
pub use server::{shutdown_signal, ApiServer};

//! REST implementation of the remote gateway boundary.

mod client;

pub use client::{RemoteConfig, RestGateway};

//! Client library for a local ComfyUI diffusion server.
//!
//! REST wrappers, typed WebSocket messages, a completion waiter that reports
//! sampler steps, and workflow graphs with typed parameter injection.

pub mod api;
pub mod client;
pub mod messages;
pub mod processor;
pub mod workflow;

//! Storyboard domain library.
//!
//! Shot templates, the project data model, the prompt compiler, consistency
//! and seeding policy, project service operations, built-in examples, import,
//! export and the JSON project store. Nothing here talks to an image backend.

pub mod aspect;
pub mod consistency;
pub mod error;
pub mod export;
pub mod import;
pub mod model;
pub mod outline;
pub mod prompt;
pub mod service;
pub mod store;
pub mod stories;
pub mod templates;
pub mod text;

pub use error::CoreError;

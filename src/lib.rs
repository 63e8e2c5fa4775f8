//! Azbuka: the Russian alphabet, phonics rules and a segment-by-segment reader
//! with text-to-speech playback.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod errors;
pub mod events;
pub mod models;
pub mod playback;
pub mod reader;
pub mod router;
pub mod services;
pub mod utils;

pub use errors::{AppError, AppResult};

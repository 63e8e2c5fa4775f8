// Utility modules shared across services

pub mod logger;
pub mod tools;

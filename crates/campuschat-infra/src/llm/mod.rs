//! Generation backend implementations.

pub mod gemini;

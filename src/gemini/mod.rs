pub mod client;
pub mod error;
pub mod types;

pub use client::{TextGenerator, VertexClient};
pub use error::GeminiError;
pub use types::{Generation, GenerationParams, SafetySetting};

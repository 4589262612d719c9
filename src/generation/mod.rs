pub mod assembler;
pub mod batch;
pub mod client;
pub mod expander;

pub use assembler::{assemble, AssembleError};
pub use batch::generate_batch;
pub use client::{GeminiImageClient, GenerationError, GenerationSettings, ImageGenerator, ImagePayload};
pub use expander::expand;

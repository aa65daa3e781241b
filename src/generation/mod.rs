//! Generation tier - the slow, rate-limited producer of last resort.
//!
//! `Generator` is the raw capability (Gemini over HTTP); `GenerationGateway`
//! wraps it with the retry policy every resolver goes through.

mod error;
mod gateway;
mod gemini;

pub use error::GenerationError;
pub use gateway::{
    GenerationGateway, GenerationRequest, Generator, RetryPolicy, Sleeper, TokioSleeper,
};
pub use gemini::GeminiClient;

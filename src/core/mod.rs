//! Core constants and error types.

mod constants;
mod error;

pub use constants::*;
pub use error::{ClientError, ConnectionError, FrameError, NoiseError, WireError};

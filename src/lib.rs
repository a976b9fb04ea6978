pub mod emission;
pub mod error;
pub mod grid;
pub mod hmm;
pub mod io;
pub mod progress;
pub mod transition;
pub mod utils;
pub mod windows;

pub use error::EngineError;
pub use hmm::{FastPsmc, FbResult};

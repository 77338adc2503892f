pub mod decoder;
pub mod interface;

pub use decoder::SymphoniaTranscoder;
pub use interface::{AudioTranscoder, TranscodeError};

// Sentence embedding — local ONNX inference, model downloads, JSON dumps.

pub mod download;
pub mod encoder;
pub mod store;
pub mod traits;

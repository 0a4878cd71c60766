//! Outbound vendor API clients
//!
//! Thin wrappers over the third-party services this platform relays:
//! a generative-language API for text analysis, an OCR vendor for
//! competitor price captures, and a speech-to-text vendor for call audio.
//! No retries and no circuit breaking; a failed call surfaces as a single
//! vendor error on the request that triggered it.

pub mod genai;
pub mod ocr;
pub mod speech;

pub use genai::GenAiClient;
pub use ocr::OcrClient;
pub use speech::SpeechClient;

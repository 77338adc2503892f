pub mod google;
pub mod interface;
pub mod locale;

pub use google::GoogleSpeechClient;
pub use interface::{RecognizeError, SpeechRecognizer};
pub use locale::recognition_locale;

//! Speaking analysis results on the glasses

mod announcer;
mod tts;

pub use announcer::{spoken_summary, AnnounceError, Announcer, AudioClipStore, Spoken};
pub use tts::{ElevenLabsSpeech, SpeechSynthesizer, SynthesizedAudio};

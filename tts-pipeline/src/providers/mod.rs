//! Speech provider implementations

mod elevenlabs;
mod mock;

pub use elevenlabs::ElevenLabsProvider;
pub use mock::MockProvider;

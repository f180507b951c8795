// Purpose: Voice orchestration and host control handoff
// This layer sits above the dsp units and wires them into one playable voice

pub mod message;
pub mod params;
pub mod voice;

pub use message::VoiceMessage;
#[cfg(feature = "rtrb")]
pub use message::VoiceHandle;
pub use params::{DelayParams, VoiceParams};
pub use voice::{midi_note_to_freq, AcidVoice};

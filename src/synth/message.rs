#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, PushError};

use crate::dsp::oscillator::Waveform;

/// Control-rate changes for a voice, applied between audio blocks.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum VoiceMessage {
    NoteOn { note: u8, accent: bool, slide: bool },
    NoteOff { note: u8 },
    AllNotesOff,
    SetCutoff(f32),
    SetResonance(f32),
    SetEnvMod(f32),
    SetAccentMod(f32),
    SetDecay(f32),
    SetAccentAmount(f32),
    SetGlide(f32),
    SetWaveform(Waveform),
    SetSubBlend(f32),
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<VoiceMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<VoiceMessage> {
    fn pop(&mut self) -> Option<VoiceMessage> {
        Consumer::pop(self).ok()
    }
}

/// Capacity of the control queue between host and voice.
pub const VOICE_QUEUE_SIZE: usize = 64;

/// Control-thread end of a voice's message queue.
///
/// Sends never block; when the queue is full the message comes back as the
/// error value.
#[cfg(feature = "rtrb")]
pub struct VoiceHandle {
    tx: Producer<VoiceMessage>,
}

#[cfg(feature = "rtrb")]
impl VoiceHandle {
    pub(crate) fn new(tx: Producer<VoiceMessage>) -> Self {
        Self { tx }
    }

    pub fn send(&mut self, message: VoiceMessage) -> Result<(), VoiceMessage> {
        self.tx.push(message).map_err(|err| match err {
            PushError::Full(message) => {
                log::warn!("voice queue full, rejecting {message:?}");
                message
            }
        })
    }

    pub fn note_on(&mut self, note: u8, accent: bool, slide: bool) -> Result<(), VoiceMessage> {
        self.send(VoiceMessage::NoteOn {
            note,
            accent,
            slide,
        })
    }

    pub fn note_off(&mut self, note: u8) -> Result<(), VoiceMessage> {
        self.send(VoiceMessage::NoteOff { note })
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32) -> Result<(), VoiceMessage> {
        self.send(VoiceMessage::SetCutoff(cutoff_hz))
    }

    pub fn set_resonance(&mut self, resonance: f32) -> Result<(), VoiceMessage> {
        self.send(VoiceMessage::SetResonance(resonance))
    }

    /// Free slots left in the queue.
    pub fn slots(&self) -> usize {
        self.tx.slots()
    }
}

#[cfg(all(test, feature = "rtrb"))]
mod tests {
    use super::*;
    use rtrb::RingBuffer;

    #[test]
    fn full_queue_returns_message() {
        let (tx, mut rx) = RingBuffer::<VoiceMessage>::new(2);
        let mut handle = VoiceHandle::new(tx);

        assert!(handle.set_cutoff(100.0).is_ok());
        assert!(handle.set_cutoff(200.0).is_ok());
        assert_eq!(handle.set_cutoff(300.0), Err(VoiceMessage::SetCutoff(300.0)));

        assert_eq!(MessageReceiver::pop(&mut rx), Some(VoiceMessage::SetCutoff(100.0)));
        assert_eq!(handle.slots(), 1);
    }
}

#[cfg(feature = "rtrb")]
use rtrb::{Consumer, RingBuffer};

use crate::{
    dsp::{
        dc_blocker::DcBlocker,
        decay::ModulationEnvelope,
        delay::StereoDelay,
        distortion::{Distortion, DistortionParams},
        envelope::{AmplitudeEnvelope, EnvelopeParams},
        ladder::{LadderFilter, MIN_CUTOFF_HZ},
        oscillator::{Oscillator, Waveform},
        processor::SampleProcessor,
        smoother::Smoother,
    },
    synth::{message::VoiceMessage, params::VoiceParams},
    valid_sample_rate, Result, DEFAULT_SAMPLE_RATE,
};

#[cfg(feature = "rtrb")]
use crate::synth::message::{MessageReceiver, VoiceHandle, VOICE_QUEUE_SIZE};

/// A4 = 440 Hz = MIDI note 69
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/*
Acid Voice
==========

One monophonic bass voice. Each sample runs the same fixed chain:

    osc ──► ladder ──► × amp ──► distortion ──► dc blocker ──► delay
             ▲  ▲        ▲
   filter env   accent   amp env × (1 + accent_gain · accent)

The cutoff knob is smoothed before it reaches the ladder, so host automation
never steps the filter.

Notes and Slides
----------------

A plain note resets the oscillator phase and retriggers the amplitude and
filter envelopes; with `accent` it also fires the accent envelope.

A slid note arriving while the gate is still held only glides the pitch.
Nothing retriggers, which is what makes a run of slid notes sound legato.
With the gate closed a slide behaves like a plain note.

Threading
---------

Every method takes `&mut self` and is meant for one audio thread. A host on
another thread either wraps the voice in its own lock or uses `with_queue`
and sends `VoiceMessage`s through the returned handle; they are drained at
the top of every `render_block`.
*/
pub struct AcidVoice {
    params: VoiceParams,
    sample_rate: f32,
    note: Option<u8>,

    osc: Oscillator,
    amp_env: AmplitudeEnvelope,
    filter_env: ModulationEnvelope,
    accent_env: ModulationEnvelope,
    cutoff: Smoother,
    filter: LadderFilter,
    distortion: Distortion,
    dc_blocker: DcBlocker,
    delay: StereoDelay,

    #[cfg(feature = "rtrb")]
    rx: Option<Consumer<VoiceMessage>>,
}

impl AcidVoice {
    /// Build a voice. The delay line is not allocated until `begin`.
    pub fn new(params: VoiceParams, sample_rate: f32) -> Self {
        let mut voice = Self {
            params,
            sample_rate: DEFAULT_SAMPLE_RATE,
            note: None,
            osc: Oscillator::with_params(params.osc),
            amp_env: AmplitudeEnvelope::with_params(params.amp_env),
            filter_env: ModulationEnvelope::with_decay(params.filter_env_decay_ms),
            accent_env: ModulationEnvelope::with_decay(params.accent_decay_ms),
            cutoff: Smoother::new(params.cutoff_smoothing_ms),
            filter: LadderFilter::with_params(params.filter),
            distortion: Distortion::with_params(params.distortion),
            dc_blocker: DcBlocker::new(params.dc_cutoff_hz),
            delay: StereoDelay::new(params.delay.max_delay_samples),
            #[cfg(feature = "rtrb")]
            rx: None,
        };

        voice.delay.set_feedback(params.delay.feedback);
        voice.delay.set_mix(params.delay.mix);
        voice.cutoff.snap_to(params.filter.cutoff_hz);
        voice.set_sample_rate(sample_rate);
        voice
    }

    /// A voice plus the handle another thread uses to control it.
    #[cfg(feature = "rtrb")]
    pub fn with_queue(params: VoiceParams, sample_rate: f32) -> (Self, VoiceHandle) {
        let (tx, rx) = RingBuffer::<VoiceMessage>::new(VOICE_QUEUE_SIZE);
        let mut voice = Self::new(params, sample_rate);
        voice.rx = Some(rx);
        (voice, VoiceHandle::new(tx))
    }

    /// Allocate the delay buffers. Call once before the first audio
    /// callback; until then the delay passes audio through.
    pub fn begin(&mut self) -> Result<()> {
        self.delay.begin()?;
        self.set_delay_times();
        Ok(())
    }

    /// Propagate a new rate to every unit. Calling it twice with the same
    /// rate changes nothing.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if !valid_sample_rate(sample_rate) {
            log::warn!("acid voice: ignoring invalid sample rate {sample_rate}");
            return;
        }
        if sample_rate != self.sample_rate {
            log::debug!("acid voice: sample rate {} -> {sample_rate}", self.sample_rate);
        }

        self.sample_rate = sample_rate;
        self.osc.set_sample_rate(sample_rate);
        self.amp_env.set_sample_rate(sample_rate);
        self.filter_env.set_sample_rate(sample_rate);
        self.accent_env.set_sample_rate(sample_rate);
        self.cutoff.set_sample_rate(sample_rate);
        self.filter.set_sample_rate(sample_rate);
        self.dc_blocker.set_sample_rate(sample_rate);
        self.delay.set_sample_rate(sample_rate);
        self.set_delay_times();
    }

    fn set_delay_times(&mut self) {
        self.delay.set_time_ms_l(self.params.delay.time_ms_l);
        self.delay.set_time_ms_r(self.params.delay.time_ms_r);
    }

    // --- Notes ---

    pub fn note_on(&mut self, note: u8, accent: bool, slide: bool) {
        log::trace!("acid voice: note on {note} accent={accent} slide={slide}");
        self.note_on_hz(midi_note_to_freq(note), accent, slide);
        self.note = Some(note);
    }

    /// Start (or slide to) a pitch given directly in Hz.
    pub fn note_on_hz(&mut self, frequency: f32, accent: bool, slide: bool) {
        // A pitch without a note number; `note_on` records its own afterwards
        self.note = None;

        if slide && self.amp_env.is_active() {
            self.osc.glide_to(frequency, self.params.glide_ms);
            return;
        }

        self.osc.set_frequency(frequency);
        self.amp_env.note_on();
        self.filter_env.trigger();
        if accent {
            self.accent_env.trigger();
        }
    }

    /// Close the gate regardless of which note is held.
    pub fn note_off(&mut self) {
        if let Some(note) = self.note.take() {
            log::trace!("acid voice: note off {note}");
        }
        self.amp_env.note_off();
    }

    /// Close the gate only if `note` is the one currently sounding.
    pub fn release_note(&mut self, note: u8) {
        if self.note == Some(note) {
            self.note_off();
        }
    }

    /// Gate is held.
    pub fn is_active(&self) -> bool {
        self.amp_env.is_active()
    }

    /// Amplitude envelope is above silence.
    pub fn is_sounding(&self) -> bool {
        self.amp_env.is_sounding()
    }

    pub fn note(&self) -> Option<u8> {
        self.note
    }

    // --- Parameters ---

    /// Base cutoff; the change is smoothed over `cutoff_smoothing_ms`.
    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.params.filter.cutoff_hz = cutoff_hz.max(MIN_CUTOFF_HZ);
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        self.filter.set_resonance(resonance);
        self.params.filter.resonance = self.filter.resonance();
    }

    pub fn set_env_mod(&mut self, depth_hz: f32) {
        self.params.filter.env_mod_hz = depth_hz;
        self.filter.set_env_mod(depth_hz);
    }

    pub fn set_accent_mod(&mut self, depth_hz: f32) {
        self.params.filter.accent_mod_hz = depth_hz;
        self.filter.set_accent_mod(depth_hz);
    }

    pub fn set_fm_amount(&mut self, amount: f32) {
        self.params.filter.fm_amount = amount;
        self.filter.set_fm_amount(amount);
    }

    /// Filter envelope decay.
    pub fn set_decay(&mut self, decay_ms: f32) {
        self.filter_env.set_decay_time(decay_ms);
        self.params.filter_env_decay_ms = self.filter_env.decay_time();
    }

    pub fn set_accent_decay(&mut self, decay_ms: f32) {
        self.accent_env.set_decay_time(decay_ms);
        self.params.accent_decay_ms = self.accent_env.decay_time();
    }

    /// Extra amplitude at full accent, clamped to 0..=1.
    pub fn set_accent_amount(&mut self, gain: f32) {
        self.params.accent_gain = gain.clamp(0.0, 1.0);
    }

    pub fn set_glide(&mut self, glide_ms: f32) {
        self.params.glide_ms = glide_ms.max(0.0);
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.osc.set_waveform(waveform);
        self.params.osc.blend = waveform.blend();
    }

    pub fn set_blend(&mut self, blend: f32) {
        self.osc.set_blend(blend);
        self.params.osc.blend = blend.clamp(0.0, 1.0);
    }

    pub fn set_sub_blend(&mut self, sub_blend: f32) {
        self.osc.set_sub_blend(sub_blend);
        self.params.osc.sub_blend = sub_blend.clamp(0.0, 1.0);
    }

    pub fn set_amp_envelope(&mut self, params: EnvelopeParams) {
        self.amp_env.set_params(params);
        self.params.amp_env = self.amp_env.params();
    }

    pub fn set_distortion(&mut self, params: DistortionParams) {
        self.distortion.set_params(params);
        self.params.distortion = self.distortion.params();
    }

    pub fn set_delay_time_ms(&mut self, left_ms: f32, right_ms: f32) {
        self.params.delay.time_ms_l = left_ms.max(0.0);
        self.params.delay.time_ms_r = right_ms.max(0.0);
        self.set_delay_times();
    }

    pub fn set_delay_feedback(&mut self, feedback: f32) {
        self.delay.set_feedback(feedback);
        self.params.delay.feedback = self.delay.feedback();
    }

    pub fn set_delay_mix(&mut self, mix: f32) {
        self.delay.set_mix(mix);
        self.params.delay.mix = self.delay.mix();
    }

    pub fn params(&self) -> &VoiceParams {
        &self.params
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    // Direct access for hosts that drive the units themselves
    pub fn oscillator(&self) -> &Oscillator {
        &self.osc
    }

    pub fn filter(&self) -> &LadderFilter {
        &self.filter
    }

    pub fn amp_envelope(&self) -> &AmplitudeEnvelope {
        &self.amp_env
    }

    pub fn filter_envelope(&self) -> &ModulationEnvelope {
        &self.filter_env
    }

    pub fn accent_envelope(&self) -> &ModulationEnvelope {
        &self.accent_env
    }

    /// Apply one control message immediately.
    pub fn apply(&mut self, message: VoiceMessage) {
        match message {
            VoiceMessage::NoteOn {
                note,
                accent,
                slide,
            } => self.note_on(note, accent, slide),
            VoiceMessage::NoteOff { note } => self.release_note(note),
            VoiceMessage::AllNotesOff => self.note_off(),
            VoiceMessage::SetCutoff(hz) => self.set_cutoff(hz),
            VoiceMessage::SetResonance(res) => self.set_resonance(res),
            VoiceMessage::SetEnvMod(hz) => self.set_env_mod(hz),
            VoiceMessage::SetAccentMod(hz) => self.set_accent_mod(hz),
            VoiceMessage::SetDecay(ms) => self.set_decay(ms),
            VoiceMessage::SetAccentAmount(gain) => self.set_accent_amount(gain),
            VoiceMessage::SetGlide(ms) => self.set_glide(ms),
            VoiceMessage::SetWaveform(waveform) => self.set_waveform(waveform),
            VoiceMessage::SetSubBlend(blend) => self.set_sub_blend(blend),
        }
    }

    fn pop_message(&mut self) -> Option<VoiceMessage> {
        #[cfg(feature = "rtrb")]
        if let Some(rx) = self.rx.as_mut() {
            return MessageReceiver::pop(rx);
        }
        None
    }

    fn drain_messages(&mut self) {
        while let Some(message) = self.pop_message() {
            self.apply(message);
        }
    }

    // --- Audio ---

    /// Everything up to (but not including) the delay.
    #[inline]
    fn next_dry(&mut self, fm_input: f32) -> f32 {
        let osc = self.osc.process();
        let amp = self.amp_env.process();
        let env = self.filter_env.process();
        let accent = self.accent_env.process();

        let cutoff = self.cutoff.process(self.params.filter.cutoff_hz);
        self.filter.track_cutoff(cutoff);
        let filtered = self.filter.process(osc, env, accent, fm_input);

        let gain = amp * (1.0 + self.params.accent_gain * accent);
        let shaped = self.distortion.process(filtered * gain);
        self.dc_blocker.process(shaped)
    }

    /// One mono sample. `fm_input` modulates the cutoff at audio rate when
    /// the filter's FM amount is non-zero.
    pub fn next_sample(&mut self, fm_input: f32) -> f32 {
        let dry = self.next_dry(fm_input);
        self.delay.process(dry)
    }

    /// Fill `out` with mono samples, after applying queued messages.
    pub fn render_block(&mut self, out: &mut [f32]) {
        self.drain_messages();
        for sample in out.iter_mut() {
            *sample = self.next_sample(0.0);
        }
    }

    /// Fill two channels; the delay taps give each side its own echo.
    pub fn render_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());
        self.drain_messages();
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let dry = self.next_dry(0.0);
            (*l, *r) = self.delay.process_frame(dry, dry);
        }
    }

    /// Silence every unit and forget the held note.
    pub fn reset(&mut self) {
        self.note = None;
        self.osc.reset_phase();
        self.amp_env.reset();
        self.filter_env.reset();
        self.accent_env.reset();
        self.filter.reset();
        self.cutoff.snap_to(self.params.filter.cutoff_hz);
        self.dc_blocker.reset();
        self.delay.reset();
    }
}

impl Default for AcidVoice {
    fn default() -> Self {
        Self::new(VoiceParams::default(), DEFAULT_SAMPLE_RATE)
    }
}

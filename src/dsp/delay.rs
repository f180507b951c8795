use crate::{dsp::processor::SampleProcessor, valid_sample_rate, Error, Result, DEFAULT_SAMPLE_RATE};

/*
Stereo Feedback Delay
=====================

Two circular buffers sharing one write index. Left and right each read their
own tap, and the value written back is the input plus the tap scaled by
feedback, squashed through tanh so feedback above 1.0 saturates instead of
exploding.

Lifecycle
---------

Construction never allocates. Buffers are sized by `begin()`, which the host
calls once during setup, after its allocator is ready and before the first
audio callback. Until then every process call is a pass-through.

Per Frame
---------

    left  = process_l(in_l)     // read tap, mix with dry
    right = process_r(in_r)
    tick(in_l, in_r)            // write tanh(in + tap * feedback), advance

`process_frame` does all three in that order.
*/

/// One second at the default sample rate.
pub const DEFAULT_MAX_DELAY_SAMPLES: usize = 44_100;

pub struct StereoDelay {
    buffer_l: Vec<f32>,
    buffer_r: Vec<f32>,
    max_delay_samples: usize,
    write_index: usize,

    sample_rate: f32,
    delay_samples_l: usize,
    delay_samples_r: usize,
    feedback: f32,
    mix: f32,
}

impl StereoDelay {
    /// Describe a delay of up to `max_delay_samples`; nothing is allocated
    /// until `begin`.
    pub const fn new(max_delay_samples: usize) -> Self {
        Self {
            buffer_l: Vec::new(),
            buffer_r: Vec::new(),
            max_delay_samples,
            write_index: 0,
            sample_rate: DEFAULT_SAMPLE_RATE,
            delay_samples_l: 10_000,
            delay_samples_r: 10_000,
            feedback: 0.3,
            mix: 0.3,
        }
    }

    /// Size both buffers. Safe to call again; later calls are no-ops once
    /// the buffers exist.
    pub fn begin(&mut self) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }
        if self.max_delay_samples < 2 {
            return Err(Error::InvalidCapacity);
        }

        let requested = self.max_delay_samples;
        for buffer in [&mut self.buffer_l, &mut self.buffer_r] {
            buffer.try_reserve_exact(requested).map_err(|_| {
                log::warn!("stereo delay: allocation of {requested} samples failed");
                Error::AllocationFailed { requested }
            })?;
            buffer.resize(requested, 0.0);
        }

        self.write_index = 0;
        self.delay_samples_l = self.clamp_delay(self.delay_samples_l);
        self.delay_samples_r = self.clamp_delay(self.delay_samples_r);
        log::debug!("stereo delay: allocated 2 x {requested} samples");
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.buffer_l.len() == self.max_delay_samples
            && self.buffer_r.len() == self.max_delay_samples
            && self.max_delay_samples >= 2
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if !valid_sample_rate(sample_rate) {
            log::warn!("stereo delay: ignoring invalid sample rate {sample_rate}");
            return;
        }
        self.sample_rate = sample_rate;
    }

    fn clamp_delay(&self, samples: usize) -> usize {
        samples.clamp(1, self.max_delay_samples.saturating_sub(1).max(1))
    }

    pub fn set_time_samples_l(&mut self, samples: usize) {
        self.delay_samples_l = self.clamp_delay(samples);
    }

    pub fn set_time_samples_r(&mut self, samples: usize) {
        self.delay_samples_r = self.clamp_delay(samples);
    }

    fn ms_to_samples(&self, ms: f32) -> usize {
        (ms.max(0.0) * 0.001 * self.sample_rate).round() as usize
    }

    pub fn set_time_ms_l(&mut self, ms: f32) {
        self.set_time_samples_l(self.ms_to_samples(ms));
    }

    pub fn set_time_ms_r(&mut self, ms: f32) {
        self.set_time_samples_r(self.ms_to_samples(ms));
    }

    /// 0.0 to 1.1; above 1.0 the repeats saturate rather than fade.
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 1.1);
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    #[inline]
    fn read_index(&self, delay: usize) -> usize {
        (self.write_index + self.max_delay_samples - delay) % self.max_delay_samples
    }

    /// Mix the left tap with `input`. Does not advance.
    pub fn process_l(&self, input: f32) -> f32 {
        if !self.is_ready() {
            return input;
        }
        let delayed = self.buffer_l[self.read_index(self.delay_samples_l)];
        (1.0 - self.mix) * input + self.mix * delayed
    }

    /// Mix the right tap with `input`. Does not advance.
    pub fn process_r(&self, input: f32) -> f32 {
        if !self.is_ready() {
            return input;
        }
        let delayed = self.buffer_r[self.read_index(self.delay_samples_r)];
        (1.0 - self.mix) * input + self.mix * delayed
    }

    /// Write the next frame into the buffers and advance one sample.
    pub fn tick(&mut self, in_l: f32, in_r: f32) {
        if !self.is_ready() {
            return;
        }

        let delayed_l = self.buffer_l[self.read_index(self.delay_samples_l)];
        let delayed_r = self.buffer_r[self.read_index(self.delay_samples_r)];

        self.buffer_l[self.write_index] = (in_l + delayed_l * self.feedback).tanh();
        self.buffer_r[self.write_index] = (in_r + delayed_r * self.feedback).tanh();

        self.write_index = (self.write_index + 1) % self.max_delay_samples;
    }

    pub fn process_frame(&mut self, in_l: f32, in_r: f32) -> (f32, f32) {
        let out = (self.process_l(in_l), self.process_r(in_r));
        self.tick(in_l, in_r);
        out
    }

    pub fn delay_samples(&self) -> (usize, usize) {
        (self.delay_samples_l, self.delay_samples_r)
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }
}

impl Default for StereoDelay {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DELAY_SAMPLES)
    }
}

/// Mono use: both channels get the same input, the left output is returned.
impl SampleProcessor for StereoDelay {
    fn process(&mut self, input: f32) -> f32 {
        self.process_frame(input, input).0
    }

    fn reset(&mut self) {
        self.buffer_l.fill(0.0);
        self.buffer_r.fill(0.0);
        self.write_index = 0;
    }
}

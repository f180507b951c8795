/// A stage that maps one input sample to one output sample.
///
/// Effect stages downstream of the ladder filter all have this shape, so a
/// host can reorder or swap them without touching the voice's feedback loop.
pub trait SampleProcessor: Send {
    fn process(&mut self, input: f32) -> f32;

    /// Clear internal memory without touching parameters.
    fn reset(&mut self) {
        // Default: stateless
    }

    /// Process a block in place.
    fn process_block(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }
}

/// Allow boxed processors to be used as processors (for dynamic dispatch)
impl SampleProcessor for Box<dyn SampleProcessor> {
    fn process(&mut self, input: f32) -> f32 {
        (**self).process(input)
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn process_block(&mut self, buffer: &mut [f32]) {
        (**self).process_block(buffer)
    }
}

/// Two processors in series.
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<A, B> Chain<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn first(&mut self) -> &mut A {
        &mut self.first
    }

    pub fn second(&mut self) -> &mut B {
        &mut self.second
    }
}

impl<A: SampleProcessor, B: SampleProcessor> SampleProcessor for Chain<A, B> {
    fn process(&mut self, input: f32) -> f32 {
        self.second.process(self.first.process(input))
    }

    fn reset(&mut self) {
        self.first.reset();
        self.second.reset();
    }
}

pub trait ProcessorExt: SampleProcessor + Sized {
    fn then<B: SampleProcessor>(self, next: B) -> Chain<Self, B> {
        Chain::new(self, next)
    }
}

impl<T: SampleProcessor> ProcessorExt for T {}

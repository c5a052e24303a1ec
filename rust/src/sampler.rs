use rand::Rng;

/// A point in the unit square, each coordinate uniform in [0, 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
}

impl SamplePoint {
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let x = rng.gen::<f64>();
        let y = rng.gen::<f64>();
        SamplePoint { x, y }
    }

    /// Quarter-circle test, boundary included.
    #[inline]
    pub fn is_inside(&self) -> bool {
        self.x * self.x + self.y * self.y <= 1.0
    }
}

/// Source of sample outcomes: `true` when a drawn point lands inside the
/// unit quarter-circle.
///
/// Implementors own their random state. A sampler is driven by exactly one
/// execution unit at a time, so it needs `&mut self` and never a lock.
pub trait Sampler {
    fn sample(&mut self) -> bool;
}

/// The Monte Carlo sampler, bound to its own random source.
#[derive(Debug, Clone)]
pub struct QuarterCircleSampler<R> {
    rng: R,
}

impl<R: Rng> QuarterCircleSampler<R> {
    pub fn new(rng: R) -> Self {
        QuarterCircleSampler { rng }
    }
}

impl<R: Rng> Sampler for QuarterCircleSampler<R> {
    #[inline]
    fn sample(&mut self) -> bool {
        SamplePoint::draw(&mut self.rng).is_inside()
    }
}

impl<S: Sampler + ?Sized> Sampler for &mut S {
    #[inline]
    fn sample(&mut self) -> bool {
        (**self).sample()
    }
}

/// Draw `samples` outcomes and count the ones inside.
pub fn count_inside<S: Sampler + ?Sized>(sampler: &mut S, samples: u64) -> u64 {
    let mut inside = 0;
    for _ in 0..samples {
        if sampler.sample() {
            inside += 1;
        }
    }
    inside
}

use crate::iir::{Coefficients, FilterStage};

/// Number of second order sections in the cascade.
pub const STAGES: usize = 5;

/// 10th order Butterworth low-pass, 40 Hz corner at a 20 kHz sample clock.
///
/// Each section has unity DC gain. Section quality factors in order:
/// 0.506, 0.561, 0.707, 1.101, 3.196.
pub const LOWPASS_40HZ_AT_20KHZ: [Coefficients; STAGES] = [
    Coefficients::new(-1.9753257, 0.9754816, 3.899393e-05),
    Coefficients::new(-1.9776989, 0.9778551, 3.904078e-05),
    Coefficients::new(-1.9822289, 0.98238545, 3.9130205e-05),
    Coefficients::new(-1.988498, 0.988655, 3.925396e-05),
    Coefficients::new(-1.9959186, 0.99607619, 3.9400446e-05),
];

/// Fixed cascade of second order sections.
///
/// The output of each section is the input of the next one. The section
/// order never changes after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterChain {
    stages: [FilterStage; STAGES],
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new(LOWPASS_40HZ_AT_20KHZ)
    }
}

impl FilterChain {
    /// Construct a cascade with zeroed state.
    pub fn new(coefficients: [Coefficients; STAGES]) -> Self {
        Self {
            stages: coefficients.map(FilterStage::new),
        }
    }

    /// Feed one sample through all sections and return the cascade output.
    #[inline]
    pub fn update(&mut self, x: f32) -> f32 {
        self.stages
            .iter_mut()
            .fold(x, |y, stage| stage.update(y))
    }

    pub fn stages(&self) -> &[FilterStage; STAGES] {
        &self.stages
    }

    /// Overall gain at DC.
    pub fn dc_gain(&self) -> f32 {
        self.stages
            .iter()
            .map(|stage| stage.coefficients().dc_gain())
            .product()
    }

    pub fn reset(&mut self) {
        self.stages.iter_mut().for_each(FilterStage::reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::isclose;

    #[test]
    fn design() {
        let q = [0.506233, 0.561163, 0.707107, 1.101345, 3.196227];
        for (c, q) in LOWPASS_40HZ_AT_20KHZ.iter().zip(q) {
            let d = Coefficients::lowpass(40. / 20e3, q);
            assert!(isclose(c.a1, d.a1, 0., 1e-5), "{c:?} {d:?}");
            assert!(isclose(c.a2, d.a2, 0., 1e-5), "{c:?} {d:?}");
            assert!(isclose(c.scale, d.scale, 1e-3, 0.), "{c:?} {d:?}");
            assert!(c.is_stable());
        }
    }

    #[test]
    fn zero_in_zero_out() {
        let mut chain = FilterChain::default();
        for _ in 0..100_000 {
            assert_eq!(chain.update(0.), 0.);
        }
        assert_eq!(chain, FilterChain::default());
    }

    #[test]
    fn cascade_order() {
        let coefficients = [
            Coefficients::new(0., 0., 1.),
            Coefficients::UNITY,
            Coefficients::UNITY,
            Coefficients::UNITY,
            Coefficients::new(0., 0., 0.5),
        ];
        let mut chain = FilterChain::new(coefficients);
        // Two binomial sections: [1, 2, 1] * [1, 2, 1] / 2
        let y: [f32; 6] = core::array::from_fn(|i| {
            chain.update(if i == 0 { 2. } else { 0. })
        });
        assert_eq!(y, [1., 4., 6., 4., 1., 0.]);
    }

    #[test]
    fn reset() {
        let mut chain = FilterChain::default();
        let first: [f32; 16] = core::array::from_fn(|_| chain.update(1000.));
        chain.reset();
        assert_eq!(chain, FilterChain::default());
        let second: [f32; 16] = core::array::from_fn(|_| chain.update(1000.));
        assert_eq!(first, second);
    }
}

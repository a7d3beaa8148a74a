use core::f32::consts::PI;
use miniconf::Tree;

/// Second order section state.
///
/// Direct form II delay line: `w0` is the most recent intermediate value,
/// `w1` the one before.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct State {
    pub w0: f32,
    pub w1: f32,
}

/// Second order section coefficients.
///
/// The numerator is fixed to `[1, 2, 1]` (double zero at Nyquist). The
/// denominator is `[1, a1, a2]`. The input is multiplied by `scale` before it
/// enters the recursion, which keeps the delay line at signal magnitude for
/// low corner frequencies.
///
/// The transfer function is
///
/// `H(z) = scale * (1 + 2 z^-1 + z^-2) / (1 + a1 z^-1 + a2 z^-2)`
///
/// # Miniconf
///
/// `{"a1": a1, "a2": a2, "scale": g}`
#[derive(Copy, Clone, Debug, PartialEq, Tree)]
pub struct Coefficients {
    pub a1: f32,
    pub a2: f32,
    pub scale: f32,
}

impl Coefficients {
    /// Exact identity section.
    ///
    /// The denominator `(1 + z^-1)^2` cancels the fixed numerator. The delay
    /// line is only marginally stable with this setting.
    pub const UNITY: Self = Self::new(2., 1., 1.);

    pub const fn new(a1: f32, a2: f32, scale: f32) -> Self {
        Self { a1, a2, scale }
    }

    /// Second order low-pass section by bilinear transform.
    ///
    /// # Arguments
    /// * `f0` - Corner frequency relative to the sample rate (`fc / fs`).
    /// * `q` - Section quality factor.
    ///
    /// # Returns
    /// Coefficients with unity DC gain.
    pub fn lowpass(f0: f32, q: f32) -> Self {
        let k = libm::tanf(PI * f0);
        let k2 = k * k;
        let norm = 1. / (1. + k / q + k2);
        Self {
            a1: 2. * (k2 - 1.) * norm,
            a2: (1. - k / q + k2) * norm,
            scale: k2 * norm,
        }
    }

    /// Gain at DC, `H(1)`.
    pub fn dc_gain(&self) -> f32 {
        4. * self.scale / (1. + self.a1 + self.a2)
    }

    /// Both poles strictly inside the unit circle.
    pub fn is_stable(&self) -> bool {
        self.a2.abs() < 1. && self.a1.abs() < 1. + self.a2
    }

    /// Feed a new input value into the section, update the state, and return
    /// the new output. Only `state` is modified.
    ///
    /// # Arguments
    /// * `state` - Current section state.
    /// * `x` - New input, before input scaling.
    #[inline]
    pub fn update(&self, state: &mut State, x: f32) -> f32 {
        let w = self.scale * x - self.a1 * state.w0 - self.a2 * state.w1;
        // The output uses the delay line before it advances.
        let y = w + 2. * state.w0 + state.w1;
        state.w1 = state.w0;
        state.w0 = w;
        y
    }
}

/// A second order section owning its delay line.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FilterStage {
    coefficients: Coefficients,
    state: State,
}

impl FilterStage {
    pub const fn new(coefficients: Coefficients) -> Self {
        Self {
            coefficients,
            state: State { w0: 0., w1: 0. },
        }
    }

    #[inline]
    pub fn update(&mut self, x: f32) -> f32 {
        self.coefficients.update(&mut self.state, x)
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Clear the delay line. The next outputs carry a settling transient.
    pub fn reset(&mut self) {
        self.state = State::default();
    }
}

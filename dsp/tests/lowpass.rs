use std::f64::consts::PI;

use dsp::{Decimation, FilterChain};

const FS: f64 = 20e3;

/// Offset sinusoid as 12 bit ADC codes.
fn tone(freq: f64, amplitude: f64, n: usize) -> impl Iterator<Item = f32> {
    (0..n).map(move |i| {
        (2048. + amplitude * (2. * PI * freq * i as f64 / FS).sin()) as f32
    })
}

/// Peak-to-peak output range after discarding the settling transient.
fn settled_range(chain: &mut FilterChain, input: impl Iterator<Item = f32>, skip: usize) -> (f32, f32) {
    input
        .map(|x| chain.update(x))
        .skip(skip)
        .fold((f32::MAX, f32::MIN), |(lo, hi), y| (lo.min(y), hi.max(y)))
}

#[test]
fn dc_settles() {
    let mut chain = FilterChain::default();
    let (lo, hi) = settled_range(&mut chain, tone(0., 0., 20_000), 10_000);
    assert!((lo - 2048.).abs() < 2.048, "{lo}");
    assert!((hi - 2048.).abs() < 2.048, "{hi}");
}

#[test]
fn passband() {
    let mut chain = FilterChain::default();
    let (lo, hi) = settled_range(&mut chain, tone(5., 1000., 40_000), 20_000);
    let amplitude = (hi - lo) / 2.;
    assert!((amplitude - 1000.).abs() < 20., "{amplitude}");
}

#[test]
fn stopband() {
    // Mains harmonics and everything above the decimated Nyquist rate vanish.
    for freq in [250., 1000., 3000.] {
        let mut chain = FilterChain::default();
        let (lo, hi) = settled_range(&mut chain, tone(freq, 1000., 20_000), 10_000);
        assert!(hi - lo < 1., "{freq} Hz: {lo}..{hi}");
    }
}

#[test]
fn decimated_stream_tracks_dc() {
    let mut chain = FilterChain::default();
    let outputs: Vec<f32> = (0..200)
        .filter_map(|_| Decimation::Last.process(&mut chain, tone(0., 0., 200)))
        .collect();
    assert_eq!(outputs.len(), 200);
    assert!((outputs[199] - 2048.).abs() < 2.048);
    assert!(outputs[0] < 100.);
}

use broaden_core::common::{DirectSettings, ToscaSettings, TwoDMapSettings};
use broaden_core::{
    DirectGeometryChopper, IdealTwoDMap, ResolutionModel, SamplingSettings, Scheme, SchemeChoice,
    ToscaLike,
};

fn regular_grid(lo: f64, hi: f64, width: f64) -> Vec<f64> {
    let count = ((hi - lo) / width).round() as usize;
    (0..=count).map(|i| lo + i as f64 * width).collect()
}

/// Evenly spread synthetic excitations with unit total intensity.
fn synthetic_spectrum(lo: f64, hi: f64, count: usize) -> (Vec<f64>, Vec<f64>) {
    let frequencies: Vec<f64> = (0..count)
        .map(|i| lo + (hi - lo) * (i as f64 + 0.5) / count as f64)
        .collect();
    let weights = vec![1.0 / count as f64; count];
    (frequencies, weights)
}

#[test]
fn tosca_convolution_conserves_intensity_on_a_sparse_spectrum() {
    let instrument = ToscaLike::new(ToscaSettings::default());
    let bins = regular_grid(0.0, 500.0, 1.0);
    let (frequencies, s_dft) = synthetic_spectrum(50.0, 450.0, 40);

    let spectrum = instrument
        .convolve_with_resolution_function(
            &frequencies,
            &bins,
            &s_dft,
            SchemeChoice::Auto,
            &SamplingSettings::default(),
        )
        .expect("tosca convolution");

    assert_eq!(spectrum.s.len(), bins.len() - 1);
    let total: f64 = spectrum.s.iter().sum();
    assert!((total - 1.0).abs() <= 0.015, "total intensity was {total}");
}

#[test]
fn dense_input_resolves_auto_to_the_interpolated_scheme() {
    // above the point threshold the auto choice must still conserve
    // intensity through the mandatory pre-binning
    let instrument = ToscaLike::new(ToscaSettings::default());
    let bins = regular_grid(0.0, 1000.0, 2.0);
    let (frequencies, s_dft) = synthetic_spectrum(100.0, 900.0, 2000);

    let spectrum = instrument
        .convolve_with_resolution_function(
            &frequencies,
            &bins,
            &s_dft,
            SchemeChoice::Auto,
            &SamplingSettings::default(),
        )
        .expect("dense tosca convolution");

    let total: f64 = spectrum.s.iter().sum();
    assert!((total - 1.0).abs() <= 0.03, "total intensity was {total}");
}

#[test]
fn fixed_scheme_override_is_honored() {
    let instrument = ToscaLike::new(ToscaSettings::default());
    let bins = regular_grid(0.0, 500.0, 1.0);
    let (frequencies, s_dft) = synthetic_spectrum(50.0, 450.0, 40);
    let settings = SamplingSettings::default();

    let truncated = instrument
        .convolve_with_resolution_function(
            &frequencies,
            &bins,
            &s_dft,
            SchemeChoice::Fixed(Scheme::NormalTruncated),
            &settings,
        )
        .expect("normal truncated convolution");
    let exact = instrument
        .convolve_with_resolution_function(
            &frequencies,
            &bins,
            &s_dft,
            SchemeChoice::Fixed(Scheme::Normal),
            &settings,
        )
        .expect("exact normal convolution");

    // both are per-bin masses of the same kernels; they differ only by
    // the truncated tails
    let truncated_total: f64 = truncated.s.iter().sum();
    let exact_total: f64 = exact.s.iter().sum();
    assert!(truncated_total <= exact_total + 1.0e-9);
    assert!((truncated_total / exact_total - 1.0).abs() <= 0.01);
}

#[test]
fn chopper_convolution_reuses_one_resolution_fit() {
    let mut instrument =
        DirectGeometryChopper::new(DirectSettings::default()).expect("default chopper");
    instrument.set_incident_energy(4000.0).expect("energy");

    let bins = regular_grid(0.0, 3500.0, 5.0);
    let (frequencies, s_dft) = synthetic_spectrum(200.0, 3300.0, 60);
    let settings = SamplingSettings::default();

    for _ in 0..3 {
        instrument
            .convolve_with_resolution_function(
                &frequencies,
                &bins,
                &s_dft,
                SchemeChoice::Auto,
                &settings,
            )
            .expect("chopper convolution");
    }
    assert_eq!(instrument.cached_fit_count(), 1);
}

#[test]
fn chopper_convolution_conserves_intensity() {
    let mut instrument =
        DirectGeometryChopper::new(DirectSettings::default()).expect("default chopper");
    instrument.set_incident_energy(4000.0).expect("energy");

    let bins = regular_grid(0.0, 4000.0, 4.0);
    let (frequencies, s_dft) = synthetic_spectrum(300.0, 3500.0, 50);

    let spectrum = instrument
        .convolve_with_resolution_function(
            &frequencies,
            &bins,
            &s_dft,
            SchemeChoice::Auto,
            &SamplingSettings::default(),
        )
        .expect("chopper convolution");

    let total: f64 = spectrum.s.iter().sum();
    assert!((total - 1.0).abs() <= 0.02, "total intensity was {total}");
}

#[test]
fn two_d_map_convolution_applies_a_constant_width() {
    let mut instrument = IdealTwoDMap::new(TwoDMapSettings::default());
    instrument.set_incident_energy(2000.0).expect("energy");

    let bins = regular_grid(0.0, 2000.0, 2.0);
    let frequencies = [1000.0];
    let s_dft = [1.0];

    let spectrum = instrument
        .convolve_with_resolution_function(
            &frequencies,
            &bins,
            &s_dft,
            SchemeChoice::Fixed(Scheme::GaussianTruncated),
            &SamplingSettings::default(),
        )
        .expect("2d-map convolution");

    // sigma = 0.01 * 2000 = 20; the peak bin carries the central mass of
    // a 20-wide Gaussian sampled every 2
    let peak = spectrum
        .s
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);
    let expected_peak = 2.0 / (20.0 * (2.0 * std::f64::consts::PI).sqrt());
    assert!(
        (peak - expected_peak).abs() <= 1.0e-3 * expected_peak.abs().max(1.0),
        "peak was {peak}, expected about {expected_peak}"
    );

    let total: f64 = spectrum.s.iter().sum();
    assert!((total - 1.0).abs() <= 0.01, "total intensity was {total}");
}

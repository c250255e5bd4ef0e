//! Direct 1D linear convolution with "same"-length output.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvolveError {
    #[error("convolution requires a non-empty signal")]
    EmptySignal,
    #[error("convolution requires a non-empty kernel")]
    EmptyKernel,
}

/// Linear convolution of `signal` with `kernel`, trimmed to the centered
/// `signal.len()` samples of the full convolution (the "same" output
/// mode of the host numerics libraries).
pub fn convolve_same(signal: &[f64], kernel: &[f64]) -> Result<Vec<f64>, ConvolveError> {
    if signal.is_empty() {
        return Err(ConvolveError::EmptySignal);
    }
    if kernel.is_empty() {
        return Err(ConvolveError::EmptyKernel);
    }

    let signal_len = signal.len();
    let kernel_len = kernel.len();
    let offset = (kernel_len - 1) / 2;

    let mut output = vec![0.0; signal_len];
    for (index, slot) in output.iter_mut().enumerate() {
        // full[m] = sum_j signal[j] * kernel[m - j]
        let m = index + offset;
        let j_lo = m.saturating_sub(kernel_len - 1);
        let j_hi = m.min(signal_len - 1);
        let mut acc = 0.0;
        for j in j_lo..=j_hi {
            acc += signal[j] * kernel[m - j];
        }
        *slot = acc;
    }

    Ok(output)
}

//! Small numeric helpers shared by the analysis stages.

/// Clamp into `[lo, hi]`, mapping non-finite input to `fallback`.
pub fn clamp_or(value: f64, lo: f64, hi: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        fallback
    }
}

/// Clamp into `[0, 1]`; NaN and infinities become 0.
pub fn clamp_unit(value: f64) -> f64 {
    clamp_or(value, 0.0, 1.0, 0.0)
}

/// The last `n` items of a slice (all of it when shorter).
pub fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance. Exactly 0 for a constant series.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 || values.iter().all(|v| *v == values[0]) {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Least-squares line through `(i, values[i])`. Returns `(slope, intercept)`.
pub fn linear_fit(values: &[f64]) -> (f64, f64) {
    match values.len() {
        0 => return (0.0, 0.0),
        1 => return (0.0, values[0]),
        _ => {}
    }

    let n = values.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = mean(values);

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }

    let slope = if den > 0.0 { num / den } else { 0.0 };
    (slope, y_mean - slope * x_mean)
}

/// Shannon entropy (natural log) of an equal-width histogram over the data range.
///
/// A constant series gets a unit-wide range centred on its value, so all
/// samples land in one bin and the entropy is 0.
pub fn histogram_entropy(values: &[f64], bins: usize) -> f64 {
    if values.is_empty() || bins == 0 {
        return 0.0;
    }

    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0;
    }
    if hi <= lo {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        // last bin is closed on the right
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let total = values.len() as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.ln()
        })
        .sum()
}

/// Numerical gradient of `values` with respect to `times`.
///
/// Interior points use the second-order nonuniform central difference;
/// endpoints use one-sided first differences. Zero spacing yields 0.
pub fn gradient(values: &[f64], times: &[f64]) -> Vec<f64> {
    let n = values.len().min(times.len());
    if n < 2 {
        return vec![0.0; n];
    }

    let diff = |dv: f64, dt: f64| if dt != 0.0 { dv / dt } else { 0.0 };

    let mut out = Vec::with_capacity(n);
    out.push(diff(values[1] - values[0], times[1] - times[0]));
    for i in 1..n - 1 {
        let hs = times[i] - times[i - 1];
        let hd = times[i + 1] - times[i];
        let den = hs * hd * (hd + hs);
        if den == 0.0 {
            out.push(0.0);
            continue;
        }
        let num = hs * hs * values[i + 1] + (hd * hd - hs * hs) * values[i] - hd * hd * values[i - 1];
        out.push(num / den);
    }
    out.push(diff(values[n - 1] - values[n - 2], times[n - 1] - times[n - 2]));
    out
}

use ndarray::{ArrayViewMut1, ArrayViewMut2, Axis};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Moments {
    pub mean: f32,
    pub std: f32,
}

impl Moments {
    pub fn zero() -> Self {
        Self { mean: 0.0, std: 0.0 }
    }

    /// Mean and sample (n - 1) standard deviation.
    pub fn of(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self::zero();
        }
        let n = buffer.len() as f64;
        let mean = buffer.iter().map(|&s| s as f64).sum::<f64>() / n;
        let std = if buffer.len() > 1 {
            let var = buffer
                .iter()
                .map(|&s| (s as f64 - mean).powi(2))
                .sum::<f64>()
                / (n - 1.0);
            var.sqrt()
        } else {
            0.0
        };
        Self {
            mean: mean as f32,
            std: std as f32,
        }
    }
}

/// Shift to zero mean and scale to unit variance in place.
///
/// A flat signal has no spread to scale by and is only centred.
pub fn standardize(buffer: &mut [f32]) -> Moments {
    let moments = Moments::of(buffer);
    let scale = if moments.std > f32::EPSILON {
        moments.std
    } else {
        1.0
    };
    for sample in buffer.iter_mut() {
        *sample = (*sample - moments.mean) / scale;
    }
    moments
}

/// Standardize every row of a `[samples, frames]` batch independently.
pub fn standardize_rows(mut batch: ArrayViewMut2<f32>) -> Vec<Moments> {
    batch
        .axis_iter_mut(Axis(0))
        .map(standardize_view)
        .collect()
}

fn standardize_view(mut row: ArrayViewMut1<f32>) -> Moments {
    match row.as_slice_mut() {
        Some(slice) => standardize(slice),
        None => {
            let mut owned = row.to_vec();
            let moments = standardize(&mut owned);
            for (dst, src) in row.iter_mut().zip(owned) {
                *dst = src;
            }
            moments
        }
    }
}

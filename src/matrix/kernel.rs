//! Vectorized inner loops shared by the dense matrix operations.
use wide::f64x4;

/// Dot product of two equally long slices.
#[inline(always)]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    let len = a.len().min(b.len());
    let chunks = len / 4;
    let mut acc = f64x4::splat(0.0);
    for i in 0..chunks {
        let o = i * 4;
        let x = f64x4::from([a[o], a[o + 1], a[o + 2], a[o + 3]]);
        let y = f64x4::from([b[o], b[o + 1], b[o + 2], b[o + 3]]);
        acc = acc + x * y;
    }
    let lanes = acc.to_array();
    let mut sum = lanes[0] + lanes[1] + lanes[2] + lanes[3];
    for i in chunks * 4..len {
        sum += a[i] * b[i];
    }
    sum
}

/// `dest += factor * src`
#[inline(always)]
pub fn axpy(dest: &mut [f64], factor: f64, src: &[f64]) {
    if factor == 0.0 {
        return;
    }
    for (d, s) in dest.iter_mut().zip(src) {
        *d += factor * s;
    }
}

//! Bicubic resampling and zero-padding of a raster patch to the archive's
//! grid size.
//!
//! Grounded in `storer.py`'s `scipy.ndimage.zoom(patch, factor, order=3)`
//! followed by `np.pad`. A bicubic convolution kernel is a small enough
//! amount of math to hand-write directly over `u16` samples rather than pull
//! in an RGBA-oriented image crate for a single grayscale operation.

use satex_core::types::Patch;

/// Catmull-Rom cubic convolution kernel (`a = -0.5`), the same coefficient
/// `scipy.ndimage.zoom`'s `order=3` spline approximates for 1-D resampling.
fn cubic_weight(t: f64) -> f64 {
	let a = -0.5;
	let t = t.abs();
	if t <= 1.0 {
		(a + 2.0) * t.powi(3) - (a + 3.0) * t.powi(2) + 1.0
	} else if t < 2.0 {
		a * t.powi(3) - 5.0 * a * t.powi(2) + 8.0 * a * t - 4.0 * a
	} else {
		0.0
	}
}

fn sample_axis(patch: &Patch, x: f64, y: f64) -> f64 {
	let x0 = x.floor() as i64;
	let y0 = y.floor() as i64;
	let mut total = 0.0;
	let mut weight_sum = 0.0;
	for j in -1..=2 {
		for i in -1..=2 {
			let sx = (x0 + i).clamp(0, patch.width as i64 - 1) as u32;
			let sy = (y0 + j).clamp(0, patch.height as i64 - 1) as u32;
			let weight = cubic_weight(x - (x0 + i) as f64) * cubic_weight(y - (y0 + j) as f64);
			total += weight * f64::from(patch.get(sx, sy));
			weight_sum += weight;
		}
	}
	if weight_sum.abs() < 1e-9 { 0.0 } else { total / weight_sum }
}

/// Resamples `patch` to `(target_width, target_height)` with bicubic
/// interpolation. A no-op if the size already matches.
#[must_use]
pub fn resample_bicubic(patch: &Patch, target_width: u32, target_height: u32) -> Patch {
	if patch.width == target_width && patch.height == target_height {
		return patch.clone();
	}
	let scale_x = patch.width as f64 / target_width as f64;
	let scale_y = patch.height as f64 / target_height as f64;

	let mut data = Vec::with_capacity((target_width * target_height) as usize);
	for ty in 0..target_height {
		for tx in 0..target_width {
			let src_x = (tx as f64 + 0.5) * scale_x - 0.5;
			let src_y = (ty as f64 + 0.5) * scale_y - 0.5;
			let value = sample_axis(patch, src_x, src_y).round().clamp(0.0, f64::from(u16::MAX));
			data.push(value as u16);
		}
	}
	Patch { width: target_width, height: target_height, data }
}

/// Zero-pads `patch` up to `(target_width, target_height)`, anchored at the
/// top-left — matches `storer.py`'s `np.pad(patch, [(0, pad_x), (0, pad_y)])`.
#[must_use]
pub fn zero_pad(patch: &Patch, target_width: u32, target_height: u32) -> Patch {
	if patch.width == target_width && patch.height == target_height {
		return patch.clone();
	}
	let mut padded = Patch::zeroed(target_width, target_height);
	for y in 0..patch.height.min(target_height) {
		for x in 0..patch.width.min(target_width) {
			let idx = (y as usize) * (target_width as usize) + (x as usize);
			padded.data[idx] = patch.get(x, y);
		}
	}
	padded
}

//! UTM zone, EPSG code and MGRS latitude-band derivation.
//!
//! Ported from the Tiler's `get_utm_zone`/`get_utm_epsg` helpers, including
//! the Norway/Svalbard exceptions to the plain 6-degree zone formula: zone 32
//! is widened to cover part of zone 31's longitude range around Norway, and
//! zones 31/33/35/37 are widened across Svalbard.

/// The UTM zone number (1-60) for a WGS84 coordinate.
#[must_use]
pub fn utm_zone(lat: f64, lon: f64) -> u8 {
	let mut zone = ((lon + 180.0) / 6.0) as u8 + 1;

	if (56.0..64.0).contains(&lat) && (3.0..12.0).contains(&lon) {
		zone = 32;
	} else if (72.0..84.0).contains(&lat) {
		zone = if (0.0..9.0).contains(&lon) {
			31
		} else if (9.0..21.0).contains(&lon) {
			33
		} else if (21.0..33.0).contains(&lon) {
			35
		} else if (33.0..42.0).contains(&lon) {
			37
		} else {
			zone
		};
	}
	zone
}

/// The EPSG code of the UTM CRS covering a WGS84 coordinate: `326xx` in the
/// northern hemisphere, `327xx` in the southern.
#[must_use]
pub fn utm_epsg(lat: f64, lon: f64) -> u32 {
	let zone = u32::from(utm_zone(lat, lon));
	let base = if lat >= 0.0 { 32600 } else { 32700 };
	base + zone
}

/// The MGRS latitude band letter for a latitude in `[-80, 84)`.
///
/// Bands run C..X (excluding I and O) in 8-degree steps from -80, except the
/// final band X which spans 12 degrees up to 84.
#[must_use]
pub fn utm_row(lat: f64) -> char {
	const BANDS: &[char] = &[
		'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X',
	];
	let clamped = lat.clamp(-80.0, 83.999_999);
	let index = (((clamped + 80.0) / 8.0) as usize).min(BANDS.len() - 1);
	BANDS[index]
}

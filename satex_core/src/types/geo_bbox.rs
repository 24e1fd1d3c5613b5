use anyhow::{Result, ensure};
use std::fmt::Debug;

/// A geographical bounding box (`GeoBBox`) represents a rectangular area on a map
/// defined by its minimum and maximum longitude (x) and latitude (y) coordinates,
/// always in WGS84 (EPSG:4326) degrees.
///
/// # Examples
///
/// ```
/// use satex_core::GeoBBox;
///
/// let bbox = GeoBBox::new(-10.0, -5.0, 10.0, 5.0).unwrap();
/// assert_eq!(bbox.as_tuple(), (-10.0, -5.0, 10.0, 5.0));
/// ```
#[derive(Clone, Copy, PartialEq)]
#[allow(clippy::manual_non_exhaustive)]
pub struct GeoBBox {
	pub x_min: f64,
	pub y_min: f64,
	pub x_max: f64,
	pub y_max: f64,
	phantom: (),
}

impl GeoBBox {
	/// Creates a new `GeoBBox` from four `f64` values: `west, south, east, north`.
	#[must_use = "GeoBBox::new returns a Result; handle the error or unwrap"]
	pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Result<GeoBBox> {
		GeoBBox {
			x_min,
			y_min,
			x_max,
			y_max,
			phantom: (),
		}
		.checked()
	}

	/// Attempts to build an optional `GeoBBox` from an optional `Vec<f64>`.
	pub fn from_option_vec(input: Option<Vec<f64>>) -> Result<Option<GeoBBox>> {
		match input {
			Some(vec) => Ok(Some(GeoBBox::try_from(vec)?)),
			None => Ok(None),
		}
	}

	/// Returns the centroid of the bounding box as `(lon, lat)`, used to pick the
	/// UTM zone a region belongs to.
	#[must_use]
	pub fn centroid(&self) -> (f64, f64) {
		((self.x_min + self.x_max) / 2.0, (self.y_min + self.y_max) / 2.0)
	}

	/// Returns the bounding box as a `Vec<f64>` in the form `[west, south, east, north]`.
	#[must_use]
	pub fn as_vec(&self) -> Vec<f64> {
		vec![self.x_min, self.y_min, self.x_max, self.y_max]
	}

	/// Returns the bounding box as a fixed-size array `[f64; 4]`.
	#[must_use]
	pub fn as_array(&self) -> [f64; 4] {
		[self.x_min, self.y_min, self.x_max, self.y_max]
	}

	/// Returns the bounding box as a tuple `(x_min, y_min, x_max, y_max)`.
	#[must_use]
	pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
		(self.x_min, self.y_min, self.x_max, self.y_max)
	}

	/// Returns the bounding box as a string in the form `[x_min, y_min, x_max, y_max]`.
	#[must_use]
	pub fn as_string_json(&self) -> String {
		format!("[{}]", self.as_string_list())
	}

	/// Returns the bounding box as a string in the form `x_min, y_min, x_max, y_max`.
	#[must_use]
	pub fn as_string_list(&self) -> String {
		format!("{},{},{},{}", self.x_min, self.y_min, self.x_max, self.y_max)
	}

	/// Expands the current bounding box in place so that it includes the area covered by `other`.
	pub fn extend(&mut self, other: &GeoBBox) {
		self.x_min = self.x_min.min(other.x_min);
		self.y_min = self.y_min.min(other.y_min);
		self.x_max = self.x_max.max(other.x_max);
		self.y_max = self.y_max.max(other.y_max);
	}

	/// Non-mutating version of [`extend`](Self::extend).
	#[must_use]
	pub fn extended(mut self, other: &GeoBBox) -> GeoBBox {
		self.extend(other);
		self
	}

	/// Intersects the current bounding box in place with `other`.
	pub fn intersect(&mut self, other: &GeoBBox) {
		self.x_min = self.x_min.max(other.x_min);
		self.y_min = self.y_min.max(other.y_min);
		self.x_max = self.x_max.min(other.x_max);
		self.y_max = self.y_max.min(other.y_max);
	}

	/// Non-mutating version of [`intersect`](Self::intersect).
	#[must_use]
	pub fn intersected(mut self, other: &GeoBBox) -> GeoBBox {
		self.intersect(other);
		self
	}

	fn checked(self) -> Result<Self> {
		ensure!(self.x_min >= -180., "x_min ({}) must be >= -180", self.x_min);
		ensure!(self.y_min >= -90., "y_min ({}) must be >= -90", self.y_min);
		ensure!(self.x_max <= 180., "x_max ({}) must be <= 180", self.x_max);
		ensure!(self.y_max <= 90., "y_max ({}) must be <= 90", self.y_max);
		ensure!(
			self.x_min <= self.x_max,
			"x_min ({}) must be <= x_max ({})",
			self.x_min,
			self.x_max
		);
		ensure!(
			self.y_min <= self.y_max,
			"y_min ({}) must be <= y_max ({})",
			self.y_min,
			self.y_max
		);
		Ok(self)
	}
}

impl Debug for GeoBBox {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"GeoBBox({}, {}, {}, {})",
			self.x_min, self.y_min, self.x_max, self.y_max
		)
	}
}

impl TryFrom<Vec<f64>> for GeoBBox {
	type Error = anyhow::Error;

	fn try_from(input: Vec<f64>) -> Result<Self> {
		ensure!(
			input.len() == 4,
			"GeoBBox must have 4 elements (x_min, y_min, x_max, y_max), got {}",
			input.len()
		);
		GeoBBox::new(input[0], input[1], input[2], input[3])
	}
}

impl TryFrom<[f64; 4]> for GeoBBox {
	type Error = anyhow::Error;
	fn try_from(input: [f64; 4]) -> Result<Self> {
		GeoBBox::new(input[0], input[1], input[2], input[3])
	}
}

impl<T: Copy + Into<f64>> TryFrom<&[T; 4]> for GeoBBox {
	type Error = anyhow::Error;
	fn try_from(input: &[T; 4]) -> Result<Self> {
		GeoBBox::new(input[0].into(), input[1].into(), input[2].into(), input[3].into())
	}
}

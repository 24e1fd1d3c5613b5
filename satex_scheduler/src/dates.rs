//! Revisit-interval date bucketing.

use anyhow::{Result, ensure};
use chrono::{Days, NaiveDate};
use satex_core::error::SatexError;

/// Splits `[start, end]` into consecutive `interval_days`-wide buckets.
///
/// The last bucket may extend past `end`; callers filter catalog items by
/// `>= start && < end` per bucket, same as the original scheduler.
pub fn get_dates_in_range(start: NaiveDate, end: NaiveDate, interval_days: i64) -> Result<Vec<(NaiveDate, NaiveDate)>> {
	ensure!(interval_days > 0, SatexError::InvalidArgument(format!("interval_days must be positive, got {interval_days}")));
	ensure!(start <= end, SatexError::InvalidArgument(format!("start date {start} is after end date {end}")));

	let step = Days::new(interval_days as u64);
	let mut buckets = Vec::new();
	let mut cursor = start;
	while cursor <= end {
		let next = cursor.checked_add_days(step).ok_or_else(|| SatexError::InvalidArgument("date range overflowed".into()))?;
		buckets.push((cursor, next));
		cursor = next;
	}
	Ok(buckets)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_single_bucket() {
		let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
		let end = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
		let buckets = get_dates_in_range(start, end, 5).unwrap();
		assert_eq!(buckets, vec![(start, NaiveDate::from_ymd_opt(2024, 1, 6).unwrap())]);
	}

	#[test]
	fn test_multiple_buckets() {
		let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
		let end = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
		let buckets = get_dates_in_range(start, end, 5).unwrap();
		assert_eq!(buckets.len(), 2);
		assert_eq!(buckets[1].0, NaiveDate::from_ymd_opt(2024, 1, 6).unwrap());
	}

	#[test]
	fn test_rejects_reversed_range() {
		let start = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
		let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
		assert!(get_dates_in_range(start, end, 5).is_err());
	}

	#[test]
	fn test_rejects_nonpositive_interval() {
		let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
		assert!(get_dates_in_range(d, d, 0).is_err());
	}
}

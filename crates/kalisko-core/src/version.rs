//! Thin operations over [`kalisko_abi::Version`]: parsing the
//! `major.minor.patch-revision` text form used in config files and CLI
//! arguments, and the comparison already defined on the ABI type itself.

use kalisko_abi::Version;
use std::fmt;

#[derive(thiserror::Error, Debug)]
pub enum VersionParseError {
	#[error("expected major.minor.patch-revision, got {0:?}")]
	BadFormat(String),
	#[error("component {0:?} is not a valid integer")]
	BadComponent(String),
}

/// Parses `"1.4.0-2"` into a [`Version`]. The revision suffix is optional
/// and defaults to 0 when omitted (`"1.4.0"`).
pub fn parse(text: &str) -> Result<Version, VersionParseError> {
	let (main, revision) = match text.split_once('-') {
		Some((main, rev)) => (main, rev),
		None => (text, "0"),
	};

	let mut parts = main.split('.');
	let major = next_component(&mut parts, text)?;
	let minor = next_component(&mut parts, text)?;
	let patch = next_component(&mut parts, text)?;
	if parts.next().is_some() {
		return Err(VersionParseError::BadFormat(text.to_string()));
	}
	let revision: u32 = revision.parse().map_err(|_| VersionParseError::BadComponent(revision.to_string()))?;

	Ok(Version::new(major, minor, patch, revision))
}

fn next_component<'a>(parts: &mut impl Iterator<Item = &'a str>, whole: &str) -> Result<u32, VersionParseError> {
	let part = parts.next().ok_or_else(|| VersionParseError::BadFormat(whole.to_string()))?;
	part.parse().map_err(|_| VersionParseError::BadComponent(part.to_string()))
}

/// Renders via [`Version`]'s own `Display`; kept as a free function so
/// callers outside this crate don't need to import the trait.
pub fn format(version: Version) -> impl fmt::Display {
	version
}

pub fn compare(a: Version, b: Version) -> std::cmp::Ordering {
	a.cmp(&b)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_full_form() {
		assert_eq!(parse("1.4.0-2").unwrap(), Version::new(1, 4, 0, 2));
	}

	#[test]
	fn parses_without_revision() {
		assert_eq!(parse("1.4.0").unwrap(), Version::new(1, 4, 0, 0));
	}

	#[test]
	fn rejects_too_few_components() {
		assert!(parse("1.4").is_err());
	}

	#[test]
	fn rejects_non_numeric_component() {
		assert!(parse("1.x.0").is_err());
	}

	#[test]
	fn compare_matches_ord() {
		assert_eq!(compare(Version::new(1, 0, 0, 0), Version::new(1, 0, 0, 1)), std::cmp::Ordering::Less);
	}
}

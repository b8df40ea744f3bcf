//! `Store` — the self-describing tree value exchanged as xcall payload.
//!
//! Owned by its producer until handed off: an xcall invocation owns its
//! request tree, and the handler owns the response tree it returns. The
//! on-disk/wire serialization of this shape is an external collaborator
//! (see [`crate::xcall::invoke_by_string`]); this module only covers the
//! in-memory value and path addressing.

/// A tagged sum used as the value type throughout the xcall surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Store {
	Int(i64),
	Float(f64),
	Str(String),
	List(Vec<Store>),
	/// Insertion-ordered key/value pairs. Keys are unique; order is
	/// preserved for output but not semantically significant.
	Array(Vec<(String, Store)>),
}

impl Store {
	pub fn create_array() -> Store {
		Store::Array(Vec::new())
	}

	pub fn create_list() -> Store {
		Store::List(Vec::new())
	}

	pub fn create_string(s: impl Into<String>) -> Store {
		Store::Str(s.into())
	}

	pub fn create_int(i: i64) -> Store {
		Store::Int(i)
	}

	pub fn create_float(f: f64) -> Store {
		Store::Float(f)
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Store::Str(s) => Some(s.as_str()),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Store::Int(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_array(&self) -> Option<&[(String, Store)]> {
		match self {
			Store::Array(entries) => Some(entries.as_slice()),
			_ => None,
		}
	}

	/// Descends `"a/b/0/c"`-style paths, creating `Array` nodes for
	/// missing intermediate keys. Fails if an existing intermediate is a
	/// scalar (can't be descended into) or a numeric segment addresses a
	/// non-`List` node.
	pub fn set_path(&mut self, path: &str, value: Store) -> Result<(), PathError> {
		let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
		set_path_segments(self, &segments, value)
	}

	/// Descends `path`, returning `None` if any segment is absent.
	pub fn get_path(&self, path: &str) -> Option<&Store> {
		let mut current = self;
		for segment in path.split('/').filter(|s| !s.is_empty()) {
			current = match current {
				Store::Array(entries) => &entries.iter().find(|(k, _)| k == segment)?.1,
				Store::List(items) => {
					let index: usize = segment.parse().ok()?;
					items.get(index)?
				}
				_ => return None,
			};
		}
		Some(current)
	}
}

#[derive(thiserror::Error, Debug)]
pub enum PathError {
	#[error("path segment addresses a scalar value")]
	IntermediateIsScalar,
	#[error("numeric path segment {0:?} out of range for list of length {1}")]
	IndexOutOfRange(String, usize),
	#[error("non-numeric path segment {0:?} used to address a list")]
	NonNumericListSegment(String),
}

fn set_path_segments(node: &mut Store, segments: &[&str], value: Store) -> Result<(), PathError> {
	let Some((head, rest)) = segments.split_first() else {
		*node = value;
		return Ok(());
	};

	if rest.is_empty() {
		return set_child(node, head, value);
	}

	let child = get_or_create_child(node, head)?;
	set_path_segments(child, rest, value)
}

fn set_child(node: &mut Store, key: &str, value: Store) -> Result<(), PathError> {
	match node {
		Store::Array(entries) => {
			if let Some(entry) = entries.iter_mut().find(|(k, _)| k == key) {
				entry.1 = value;
			} else {
				entries.push((key.to_string(), value));
			}
			Ok(())
		}
		Store::List(items) => {
			let index: usize = key.parse().map_err(|_| PathError::NonNumericListSegment(key.to_string()))?;
			if index >= items.len() {
				return Err(PathError::IndexOutOfRange(key.to_string(), items.len()));
			}
			items[index] = value;
			Ok(())
		}
		Store::Int(_) | Store::Float(_) | Store::Str(_) => Err(PathError::IntermediateIsScalar),
	}
}

fn get_or_create_child<'a>(node: &'a mut Store, key: &str) -> Result<&'a mut Store, PathError> {
	match node {
		Store::Array(entries) => {
			if let Some(idx) = entries.iter().position(|(k, _)| k == key) {
				return Ok(&mut entries[idx].1);
			}
			entries.push((key.to_string(), Store::create_array()));
			Ok(&mut entries.last_mut().unwrap().1)
		}
		Store::List(items) => {
			let index: usize = key.parse().map_err(|_| PathError::NonNumericListSegment(key.to_string()))?;
			items.get_mut(index).ok_or(PathError::IndexOutOfRange(key.to_string(), items.len()))
		}
		Store::Int(_) | Store::Float(_) | Store::Str(_) => Err(PathError::IntermediateIsScalar),
	}
}

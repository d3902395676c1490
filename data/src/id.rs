use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result};

// Index of an interned catalog string
pub type Id = lasso::Spur;

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct CatalogEntry {
	pub key: String,
	pub name: String,
}

/// Canonical item names, keyed by the market's internal item key.
///
/// Iteration order is insertion order. Name resolution walks the catalog in
/// that order, so ties behave the same on every run.
pub struct Catalog {
	strings: lasso::RodeoReader,
	entries: Vec<(Id, Id)>,
	by_key: HashMap<Id, usize>,
	by_name: HashMap<Id, usize>,
}

impl Default for Catalog {
	fn default() -> Self {
		Self::from_pairs(std::iter::empty::<(String, String)>())
	}
}

impl Catalog {
	/// Builds a catalog from `(key, name)` pairs.
	///
	/// A repeated key keeps its first name.
	pub fn from_pairs<K: AsRef<str>, N: AsRef<str>>(pairs: impl IntoIterator<Item = (K, N)>) -> Self {
		let mut strings = lasso::Rodeo::new();
		let mut entries = Vec::new();
		let mut by_key = HashMap::new();
		let mut by_name = HashMap::new();

		for (key, name) in pairs {
			let key_id = strings.get_or_intern(key.as_ref());
			if by_key.contains_key(&key_id) {
				log::debug!("catalog: ignoring duplicate key {}", key.as_ref());
				continue;
			}
			let name_id = strings.get_or_intern(name.as_ref().trim());
			by_key.insert(key_id, entries.len());
			by_name.entry(name_id).or_insert(entries.len());
			entries.push((key_id, name_id));
		}

		Self {
			strings: strings.into_reader(),
			entries,
			by_key,
			by_name,
		}
	}

	pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
		Self::from_pairs(entries.into_iter().map(|v| (v.key, v.name)))
	}

	/// Parse a JSON array of `{ "key": ..., "name": ... }` objects.
	pub fn from_json(bytes: &[u8]) -> Result<Self> {
		let entries: Vec<CatalogEntry> = serde_json::from_slice(bytes).context("Decode catalog JSON")?;
		Ok(Self::from_entries(entries))
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let bytes = std::fs::read(path).with_context(|| format!("Read catalog {}", path.display()))?;
		Self::from_json(&bytes).with_context(|| format!("Parse catalog {}", path.display()))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn key(&self, index: usize) -> &str {
		self.strings.resolve(&self.entries[index].0)
	}

	pub fn name(&self, index: usize) -> &str {
		self.strings.resolve(&self.entries[index].1)
	}

	/// `(key, name)` in catalog order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
		self.entries
			.iter()
			.map(|(k, n)| (self.strings.resolve(k), self.strings.resolve(n)))
	}

	pub fn index_of_name(&self, name: &str) -> Option<usize> {
		self.by_name.get(&self.strings.get(name)?).copied()
	}

	pub fn name_for_key(&self, key: &str) -> Option<&str> {
		let index = *self.by_key.get(&self.strings.get(key)?)?;
		Some(self.name(index))
	}

	pub fn key_for_name(&self, name: &str) -> Option<&str> {
		Some(self.key(self.index_of_name(name)?))
	}
}

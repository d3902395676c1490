use crate::{Catalog, DistanceAlgorithm, Language};

/// Outcome of matching one recognized string against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
	pub key: String,
	pub name: String,
	pub distance: usize,
	/// More than one catalog entry shares the lowest distance.
	pub ambiguous: bool,
}

impl Resolution {
	/// Ambiguous matches and implausibly short names both warrant a warning.
	pub fn low_confidence(&self, lang: Language) -> bool {
		self.ambiguous || lang.is_short_name(&self.name)
	}
}

// Name prefixes that OCR routinely confuses with each other. When two catalog
// entries from one pair tie, the later one wins instead of flagging the match.
// The flag is cleared even if a third, unrelated entry tied earlier in catalog
// order (Gara, X, Ivara ends unflagged on Ivara). This only covers the pair
// observed in practice.
const CONFUSABLE_PREFIXES: &[(&str, &str)] = &[("Gara", "Ivara")];

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
	s.get(..prefix.len())
		.is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn is_confusable_pair(a: &str, b: &str) -> bool {
	CONFUSABLE_PREFIXES.iter().any(|&(x, y)| {
		(starts_with_ignore_case(a, x) && starts_with_ignore_case(b, y))
			|| (starts_with_ignore_case(a, y) && starts_with_ignore_case(b, x))
	})
}

/// Maps noisy text to the closest canonical catalog name.
pub struct NameResolver<'a> {
	catalog: &'a Catalog,
	language: Language,
	algorithm: DistanceAlgorithm,
}

impl<'a> NameResolver<'a> {
	pub fn new(catalog: &'a Catalog, language: Language) -> Self {
		Self {
			catalog,
			language,
			algorithm: DistanceAlgorithm::for_language(language),
		}
	}

	pub fn language(&self) -> Language {
		self.language
	}

	pub fn algorithm(&self) -> DistanceAlgorithm {
		self.algorithm
	}

	/// Attempts to find the closest item name from a dirty ocr string.
	///
	/// Returns `None` for blank input or an empty catalog; there is nothing to
	/// guess from.
	pub fn resolve(&self, text: &str) -> Option<Resolution> {
		let text = text.trim();
		if text.is_empty() || self.catalog.is_empty() {
			return None;
		}

		// Exact names skip the scan.
		if let Some(index) = self.catalog.index_of_name(text) {
			return Some(self.resolution(index, 0, false));
		}

		let mut best: Option<(usize, usize)> = None;
		let mut ambiguous = false;
		for (index, (_, name)) in self.catalog.iter().enumerate() {
			let distance = self.algorithm.distance(text, name);
			match best {
				None => best = Some((index, distance)),
				Some((_, min)) if distance < min => {
					best = Some((index, distance));
					ambiguous = false;
				}
				Some((min_index, min)) if distance == min => {
					if is_confusable_pair(self.catalog.name(min_index), name) {
						best = Some((index, distance));
						ambiguous = false;
					} else {
						ambiguous = true;
					}
				}
				_ => {}
			}
		}

		let (index, distance) = best?;
		if ambiguous {
			log::debug!(
				"ambiguous match for {text:?}: {:?} at distance {distance}",
				self.catalog.name(index)
			);
		}
		Some(self.resolution(index, distance, ambiguous))
	}

	fn resolution(&self, index: usize, distance: usize, ambiguous: bool) -> Resolution {
		Resolution {
			key: self.catalog.key(index).to_owned(),
			name: self.catalog.name(index).to_owned(),
			distance,
			ambiguous,
		}
	}
}

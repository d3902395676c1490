//! Edit distances between noisy OCR text and catalog names.

use crate::Language;

/// Which edit distance to use for a recognition run.
///
/// Chosen once from the active [`Language`] so the per-candidate loop never
/// looks at the locale again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceAlgorithm {
	Default,
	KoreanPhonetic,
}

impl DistanceAlgorithm {
	pub fn for_language(lang: Language) -> Self {
		match lang {
			Language::English => Self::Default,
			Language::Korean => Self::KoreanPhonetic,
		}
	}

	#[inline]
	pub fn distance(&self, a: &str, b: &str) -> usize {
		match self {
			Self::Default => default_distance(a, b),
			Self::KoreanPhonetic => crate::korean::korean_distance(a, b),
		}
	}
}

/// Case-insensitive Levenshtein distance where inserting or deleting
/// whitespace is free.
///
/// OCR tends to invent or swallow spaces, so `"Nova Prime"` and
/// `"Nova  Prime"` score 0. Substituting a space for a letter still costs 1.
pub fn default_distance(a: &str, b: &str) -> usize {
	let a = a.chars().flat_map(char::to_lowercase).collect::<Vec<_>>();
	let b = b.chars().flat_map(char::to_lowercase).collect::<Vec<_>>();

	let cost = |c: char| usize::from(!c.is_whitespace());

	let mut prev = Vec::with_capacity(b.len() + 1);
	prev.push(0usize);
	for &c in &b {
		let last = prev[prev.len() - 1];
		prev.push(last + cost(c));
	}
	let mut cur = vec![0usize; b.len() + 1];

	for &ca in &a {
		cur[0] = prev[0] + cost(ca);
		for (j, &cb) in b.iter().enumerate() {
			let delete = prev[j + 1] + cost(ca);
			let insert = cur[j] + cost(cb);
			let substitute = prev[j] + usize::from(ca != cb);
			cur[j + 1] = delete.min(insert).min(substitute);
		}
		std::mem::swap(&mut prev, &mut cur);
	}

	prev[b.len()]
}

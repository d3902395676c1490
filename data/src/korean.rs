//! Korean edit distance over decomposed Hangul syllables.
//!
//! OCR on Hangul usually gets the syllable block right but confuses jamo that
//! look or sound alike (ㅂ/ㅍ, ㅓ/ㅕ, ...). Instead of treating a syllable
//! mismatch as one flat substitution, each syllable is split into its initial,
//! medial and final jamo and every slot is scored against a confusion group.

const SYLLABLE_FIRST: u32 = 0xAC00;
const SYLLABLE_LAST: u32 = 0xD7A3;
const MEDIAL_COUNT: u32 = 21;
const FINAL_COUNT: u32 = 28;

/// Cost of inserting or deleting one character. Equal to the worst possible
/// syllable substitution (3 slots × 3).
pub const INDEL_COST: usize = 9;
const SAME_GROUP_COST: usize = 2;
const OTHER_GROUP_COST: usize = 3;

// Confusion group per initial consonant:
// ㄱ ㄲ ㄴ ㄷ ㄸ ㄹ ㅁ ㅂ ㅃ ㅅ ㅆ ㅇ ㅈ ㅉ ㅊ ㅋ ㅌ ㅍ ㅎ
// 0 labial, 1 alveolar, 2 palatal, 3 velar/glottal
const INITIAL_GROUPS: [u8; 19] = [3, 3, 1, 1, 1, 1, 0, 0, 0, 1, 1, 3, 2, 2, 2, 3, 1, 0, 3];

// ㅏ ㅐ ㅑ ㅒ ㅓ ㅔ ㅕ ㅖ ㅗ ㅘ ㅙ ㅚ ㅛ ㅜ ㅝ ㅞ ㅟ ㅠ ㅡ ㅢ ㅣ
// 0 front, 1 w-diphthong, 2 open, 3 rounded/back
const MEDIAL_GROUPS: [u8; 21] = [2, 0, 2, 0, 2, 0, 2, 0, 3, 1, 1, 1, 3, 3, 1, 1, 1, 3, 3, 0, 0];

// (none) ㄱ ㄲ ㄳ ㄴ ㄵ ㄶ ㄷ ㄹ ㄺ ㄻ ㄼ ㄽ ㄾ ㄿ ㅀ ㅁ ㅂ ㅄ ㅅ ㅆ ㅇ ㅈ ㅊ ㅋ ㅌ ㅍ ㅎ
// 0 none, 1 velar, 2 alveolar, 3 liquid, 4 labial
const FINAL_GROUPS: [u8; 28] = [
	0, 1, 1, 1, 2, 2, 2, 2, 3, 1, 4, 3, 3, 3, 4, 3, 4, 4, 4, 2, 2, 1, 2, 2, 1, 2, 4, 2,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Jamo {
	initial: u8,
	medial: u8,
	final_: u8,
}

fn decompose(c: char) -> Option<Jamo> {
	let code = c as u32;
	if !(SYLLABLE_FIRST..=SYLLABLE_LAST).contains(&code) {
		return None;
	}
	let index = code - SYLLABLE_FIRST;
	Some(Jamo {
		initial: (index / (MEDIAL_COUNT * FINAL_COUNT)) as u8,
		medial: ((index % (MEDIAL_COUNT * FINAL_COUNT)) / FINAL_COUNT) as u8,
		final_: (index % FINAL_COUNT) as u8,
	})
}

#[inline]
fn slot_cost(a: u8, b: u8, groups: &[u8]) -> usize {
	if a == b {
		0
	} else if groups[a as usize] == groups[b as usize] {
		SAME_GROUP_COST
	} else {
		OTHER_GROUP_COST
	}
}

fn substitution_cost(a: char, b: char) -> usize {
	if a == b {
		return 0;
	}
	match (decompose(a), decompose(b)) {
		(Some(a), Some(b)) => {
			slot_cost(a.initial, b.initial, &INITIAL_GROUPS)
				+ slot_cost(a.medial, b.medial, &MEDIAL_GROUPS)
				+ slot_cost(a.final_, b.final_, &FINAL_GROUPS)
		}
		_ => INDEL_COST,
	}
}

fn normalize(s: &str) -> Vec<char> {
	s.to_lowercase()
		.replace(crate::Language::Korean.blueprint_word(), "")
		.chars()
		.filter(|c| !c.is_whitespace())
		.collect()
}

pub fn korean_distance(a: &str, b: &str) -> usize {
	let a = normalize(a);
	let b = normalize(b);

	let mut prev = (0..=b.len()).map(|j| j * INDEL_COST).collect::<Vec<_>>();
	let mut cur = vec![0usize; b.len() + 1];

	for (i, &ca) in a.iter().enumerate() {
		cur[0] = (i + 1) * INDEL_COST;
		for (j, &cb) in b.iter().enumerate() {
			let delete = prev[j + 1] + INDEL_COST;
			let insert = cur[j] + INDEL_COST;
			let substitute = prev[j] + substitution_cost(ca, cb);
			cur[j + 1] = delete.min(insert).min(substitute);
		}
		std::mem::swap(&mut prev, &mut cur);
	}

	prev[b.len()]
}

use regex::Regex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
	#[default]
	English,
	Korean,
}

impl Language {
	/// Parses an application locale string such as `"en"`, `"ko"` or `"ko-KR"`.
	///
	/// Anything that isn't Korean uses the English rules.
	pub fn from_locale(locale: &str) -> Self {
		let primary = locale
			.split(['-', '_'])
			.next()
			.unwrap_or_default()
			.trim();
		if primary.eq_ignore_ascii_case("ko") || primary.eq_ignore_ascii_case("korean") {
			Self::Korean
		} else {
			Self::English
		}
	}

	pub fn ocr_code(&self) -> &'static str {
		match self {
			Self::English => "latin",
			Self::Korean => "korean",
		}
	}

	/// Word the game appends to blueprint names in this language.
	pub fn blueprint_word(&self) -> &'static str {
		match self {
			Self::English => "Blueprint",
			Self::Korean => "설계도",
		}
	}

	/// Canonical names shorter than this are too short to trust without a second look.
	pub fn min_name_len(&self) -> usize {
		match self {
			Self::English => 13,
			Self::Korean => 6,
		}
	}

	/// Length of a name as measured by [`Language::min_name_len`].
	pub fn name_len(&self, name: &str) -> usize {
		match self {
			Self::English => name.chars().count(),
			Self::Korean => name.chars().filter(|c| !c.is_whitespace()).count(),
		}
	}

	pub fn is_short_name(&self, name: &str) -> bool {
		self.name_len(name) < self.min_name_len()
	}

	/// Strips OCR noise: keeps letters of this language's script and spaces,
	/// then collapses whitespace.
	pub fn clean_ocr_text(&self, raw: &str) -> String {
		static LATIN: std::sync::LazyLock<Regex> =
			std::sync::LazyLock::new(|| Regex::new(r"[^A-Za-z\s]").expect("regex"));
		static HANGUL: std::sync::LazyLock<Regex> =
			std::sync::LazyLock::new(|| Regex::new(r"[^A-Za-z\p{Hangul}\s]").expect("regex"));

		let re = match self {
			Self::English => &LATIN,
			Self::Korean => &HANGUL,
		};
		re.replace_all(raw, "")
			.split_whitespace()
			.collect::<Vec<_>>()
			.join(" ")
	}
}

use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// The speech model takes the spoken language as an ISO 639-1 (2-letter)
/// code. Users may also give ISO 639-2 (3-letter) codes, which are mapped
/// back to their 2-letter form before being handed to the model.
/// Language code type
#[derive(Debug, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

// @const: ISO 639-2/B codes that differ from their 639-2/T form
const PART2B_TO_PART2T: [(&str, &str); 18] = [
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 if Language::from_639_1(&normalized_code).is_some() => Ok(LanguageCodeType::Part1),
        3 if Language::from_639_3(&normalized_code).is_some() => Ok(LanguageCodeType::Part2T),
        3 if PART2B_TO_PART2T.iter().any(|(b, _)| *b == normalized_code) => {
            Ok(LanguageCodeType::Part2B)
        }
        _ => Err(anyhow!("Invalid language code: {}", code)),
    }
}

/// Normalize a language code to the ISO 639-1 (2-letter) form the speech model expects
///
/// "auto" is passed through so the model detects the language itself.
pub fn normalize_for_model(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();
    if normalized_code == "auto" {
        return Ok(normalized_code);
    }

    let part2t = PART2B_TO_PART2T
        .iter()
        .find(|(b, _)| *b == normalized_code)
        .map(|(_, t)| t.to_string())
        .unwrap_or_else(|| normalized_code.clone());

    let language = match part2t.len() {
        2 => Language::from_639_1(&part2t),
        3 => Language::from_639_3(&part2t),
        _ => None,
    }
    .ok_or_else(|| anyhow!("Invalid language code: {}", code))?;

    language
        .to_639_1()
        .map(|c| c.to_string())
        .ok_or_else(|| anyhow!("Language '{}' has no ISO 639-1 code", code))
}

/// Get the English name of a language code, for log messages
pub fn get_language_name(code: &str) -> Result<String> {
    let model_code = normalize_for_model(code)?;
    if model_code == "auto" {
        return Ok("auto-detected".to_string());
    }

    Language::from_639_1(&model_code)
        .map(|lang| lang.to_name().to_string())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

//! Region detection from flag emoji in node names
//!
//! Flag emojis are composed of two Regional Indicator Symbols.
//! For example, 🇺🇸 (US flag) = 🇺 (U+1F1FA) + 🇸 (U+1F1F8).

const REGIONAL_INDICATOR_A: u32 = 0x1F1E6;
const REGIONAL_INDICATOR_Z: u32 = 0x1F1FF;

/// Extract the first flag emoji in `text` as a two-letter country code.
///
/// Indicators pair up from the start of each run, so `🇦🇺🇸` reads as `AU`
/// followed by a lone `🇸`, never as `US`.
pub fn extract_country_code(text: &str) -> Option<String> {
    let mut pending = None;

    for c in text.chars() {
        match (pending, regional_indicator_to_letter(c)) {
            (Some(first), Some(second)) => return Some(format!("{first}{second}")),
            (None, Some(first)) => pending = Some(first),
            (_, None) => pending = None,
        }
    }
    None
}

/// Convert a Regional Indicator Symbol to its letter (A-Z).
fn regional_indicator_to_letter(c: char) -> Option<char> {
    let code = c as u32;
    if (REGIONAL_INDICATOR_A..=REGIONAL_INDICATOR_Z).contains(&code) {
        char::from_u32('A' as u32 + (code - REGIONAL_INDICATOR_A))
    } else {
        None
    }
}

/// Convert an ASCII letter to its Regional Indicator Symbol.
fn letter_to_regional_indicator(c: char) -> Option<char> {
    let upper = c.to_ascii_uppercase();
    if upper.is_ascii_uppercase() {
        char::from_u32(REGIONAL_INDICATOR_A + (upper as u32 - 'A' as u32))
    } else {
        None
    }
}

/// Convert a two-letter country code to a flag emoji.
pub fn country_code_to_flag(code: &str) -> Option<String> {
    let mut chars = code.chars();
    let (Some(first), Some(second), None) = (chars.next(), chars.next(), chars.next()) else {
        return None;
    };
    Some(format!(
        "{}{}",
        letter_to_regional_indicator(first)?,
        letter_to_regional_indicator(second)?
    ))
}

/// Region group name, e.g. "🇺🇸 US".
pub fn region_group_name(code: &str) -> String {
    match country_code_to_flag(code) {
        Some(flag) => format!("{flag} {code}"),
        None => code.to_string(),
    }
}

/// Whether `code` is two ASCII letters
pub fn is_country_code(code: &str) -> bool {
    code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic())
}

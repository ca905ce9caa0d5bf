//! Title and facility-name cleanup for text scraped out of noisy HTML:
//! navigation bleed, duplicated screen-reader text, phone numbers, cookie
//! banners, and location labels that leak into heading elements.

use std::sync::LazyLock;

use regex::Regex;

use crate::classify;

static TITLE_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(oferta pracy|oferty pracy|oferta|praca)\s*[–-]\s*").unwrap()
});
static NAV_TAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(BIP|Intranet|Poczta|Rejestracja|Menu|Szukaj)\b.*").unwrap()
});
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2,3}\s*\d{3}\s*\d{2}\s*\d{2}").unwrap());
static COOKIE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Ta strona.*").unwrap());
static WORKPLACE_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)miejsce\s+pracy\s*:?\s*[A-Za-z\s]*").unwrap());
static TRAILING_SEP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[–\-:]\s*$").unwrap());
static FACILITY_TAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(miejsce pracy|termin zgłoszenia|termin|aplikuj|rozmowy).*").unwrap()
});
static FACILITY_ROLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(pielęgniarka|pielęgniarz|lekarz|położna|ratownik)").unwrap()
});
static SEGMENT_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[–-]\s+").unwrap());

fn squeeze_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapses text that was rendered twice (visible plus screen-reader copy):
/// first at the whole-string level, then at the word and two-word-phrase
/// level. "Nurse PractitionerNurse Practitioner" becomes "Nurse Practitioner".
pub fn collapse_duplicated_text(input: &str) -> String {
    let squeezed = squeeze_whitespace(input);
    let halved = collapse_halves(&squeezed).unwrap_or(squeezed);
    collapse_repeated_words(&halved)
}

fn collapse_halves(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    if len < 8 {
        return None;
    }
    let mid = len / 2;
    for split in [mid, mid + 1, mid.saturating_sub(1)] {
        if split == 0 || split >= len {
            continue;
        }
        let first: String = chars[..split].iter().collect();
        let second: String = chars[split..].iter().collect();
        let (first, second) = (first.trim(), second.trim());
        if first.is_empty() || second.is_empty() {
            continue;
        }
        let (first_low, second_low) = (first.to_lowercase(), second.to_lowercase());
        if first_low == second_low {
            return Some(first.to_string());
        }
        // One half contains the other with a matching boundary.
        if second_low.starts_with(&first_low) && second_low.len() > first_low.len() {
            return Some(second.to_string());
        }
        if first_low.ends_with(&second_low) && first_low.len() > second_low.len() {
            return Some(first.to_string());
        }
    }
    None
}

fn collapse_repeated_words(text: &str) -> String {
    let words: Vec<&str> = text.split(' ').filter(|w| !w.is_empty()).collect();
    let mut out: Vec<&str> = Vec::with_capacity(words.len());
    let mut i = 0;
    while i < words.len() {
        // Repeated two-word phrase.
        if i + 3 < words.len() && words[i] == words[i + 2] && words[i + 1] == words[i + 3] {
            out.push(words[i]);
            out.push(words[i + 1]);
            i += 4;
            while i + 1 < words.len() && words[i] == words[i - 2] && words[i + 1] == words[i - 1] {
                i += 2;
            }
            continue;
        }
        // Repeated single word.
        if i + 1 < words.len() && words[i] == words[i + 1] {
            out.push(words[i]);
            i += 2;
            while i < words.len() && words[i] == words[i - 1] {
                i += 1;
            }
            continue;
        }
        out.push(words[i]);
        i += 1;
    }
    out.join(" ")
}

/// Truncates to at most `limit` characters, cutting at a sentence boundary
/// when one falls in the second half of the window, else at a word boundary,
/// appending an ellipsis for non-sentence cuts.
pub fn truncate_at_boundary(text: &str, limit: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= limit {
        return text.to_string();
    }
    let window: String = chars[..limit].iter().collect();
    let min_cut = limit / 2;

    if let Some(pos) = window
        .char_indices()
        .filter(|(_, c)| matches!(c, '.' | '!' | '?' | ';'))
        .map(|(i, c)| i + c.len_utf8())
        .last()
    {
        let kept: String = window[..pos].to_string();
        if kept.chars().count() >= min_cut {
            return kept.trim().to_string();
        }
    }
    if let Some(pos) = window.rfind(' ') {
        let kept = window[..pos].trim();
        if kept.chars().count() >= min_cut {
            return format!("{kept}...");
        }
    }
    format!("{}...", window.trim())
}

/// Removes known boilerplate from a scraped job title and, for multi-segment
/// `Facility – City – Role` titles, keeps only the trailing role segment(s).
pub fn clean_title(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    // Phones go first: the word collapse eats the doubled "05" group of a
    // number like "58 727 05 05" and leaves an unmatchable remainder.
    let mut title = PHONE_RE.replace_all(raw.trim(), "").into_owned();
    title = collapse_duplicated_text(&title);
    title = TITLE_PREFIX_RE.replace(&title, "").into_owned();
    title = NAV_TAIL_RE.replace(&title, "").into_owned();
    title = COOKIE_RE.replace(&title, "").into_owned();
    title = WORKPLACE_LABEL_RE.replace_all(&title, "").into_owned();
    title = squeeze_whitespace(&title);
    title = TRAILING_SEP_RE.replace(&title, "").into_owned();
    title = recover_from_nav_prefix(&title);
    title = keep_role_segments(&title);
    let title = truncate_at_boundary(&title, 500);
    truncate_at_boundary(&title, 200).trim().to_string()
}

/// When navigation text survived at the start, restart the title at the first
/// word carrying a job keyword.
fn recover_from_nav_prefix(title: &str) -> String {
    let words: Vec<&str> = title.split(' ').collect();
    let head = words
        .iter()
        .take(3)
        .map(|w| w.to_uppercase())
        .collect::<Vec<_>>()
        .join(" ");
    if !["BIP", "INTRANET", "POCZTA"].iter().any(|nav| head.contains(nav)) {
        return title.to_string();
    }
    let job_keywords = ["pielęgniarka", "lekarz", "położna", "ratownik", "oferta", "praca"];
    for (i, word) in words.iter().enumerate() {
        let lowered = word.to_lowercase();
        if job_keywords.iter().any(|kw| lowered.contains(kw)) {
            return words[i..].join(" ");
        }
    }
    title.to_string()
}

/// `Facility – City – Role` titles keep only the role segment; two trailing
/// role segments are combined (dual postings like "Pielęgniarka – Położna").
fn keep_role_segments(title: &str) -> String {
    let segments: Vec<&str> = SEGMENT_SPLIT_RE
        .split(title)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if segments.len() < 2 {
        return title.to_string();
    }
    let last = segments[segments.len() - 1];
    if !classify::contains_role_keyword(last) {
        return title.to_string();
    }
    let second_last = segments[segments.len() - 2];
    if segments.len() >= 3 && classify::contains_role_keyword(second_last) {
        return format!("{second_last} – {last}");
    }
    last.to_string()
}

/// Extracts a facility name from a dash-separated title, the second segment
/// of patterns like "Oferta pracy – Facility – Role".
pub fn facility_from_title(title: &str) -> Option<String> {
    if !title.contains('–') && !title.contains('-') {
        return None;
    }
    let normalized = title.replace('–', "-");
    let parts: Vec<&str> = normalized.split('-').map(str::trim).collect();
    if parts.len() < 2 || parts[1].is_empty() {
        return None;
    }
    Some(parts[1].to_string())
}

pub fn clean_facility_name(raw: &str, default: &str) -> String {
    if raw.trim().is_empty() {
        return default.to_string();
    }
    let mut name = raw.trim().to_string();
    name = FACILITY_TAIL_RE.replace(&name, "").into_owned();
    name = WORKPLACE_LABEL_RE.replace_all(&name, "").into_owned();
    name = NAV_TAIL_RE.replace(&name, "").into_owned();
    name = PHONE_RE.replace_all(&name, "").into_owned();
    name = squeeze_whitespace(&name);
    name = TRAILING_SEP_RE.replace(&name, "").into_owned();
    name = strip_role_bleed(&name);
    let name = truncate_at_boundary(&name, 255);
    let cleaned = name.trim().to_string();
    if cleaned.is_empty() {
        default.to_string()
    } else {
        cleaned
    }
}

/// A role title pasted into the facility field ("Pielęgniarka Pracownia
/// Endoskopii") leaves just the department after the role word.
fn strip_role_bleed(name: &str) -> String {
    let Some(m) = FACILITY_ROLE_RE.find(name) else {
        return name.to_string();
    };
    let after = &name[m.end()..];
    let stripped = FACILITY_ROLE_RE.replace_all(after, "");
    squeeze_whitespace(stripped.trim_matches(|c: char| c == '/' || c.is_whitespace()))
}

//! Short synopsis generation for job cards. A meaningful description is
//! summarized directly; otherwise a templated sentence is built from the
//! classified fields.

use std::sync::LazyLock;

use regex::Regex;

static SENTENCE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+\s+").unwrap());
static BOILERPLATE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^(menu|kontakt|o nas|rejestracja|bip|intranet)",
        r"cookie",
        r"polityka prywatności",
        r"regulamin",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

// Human-readable labels for the templated summary, broader than the role
// taxonomy so e.g. physiotherapists read naturally.
const ROLE_LABELS: &[(&str, &str)] = &[
    ("pielęgniarka", "Pielęgniarka"),
    ("pielęgniarz", "Pielęgniarz"),
    ("położna", "Położna"),
    ("położny", "Położny"),
    ("lekarz", "Lekarz"),
    ("fizjoterapeuta", "Fizjoterapeuta"),
    ("fizjoterapeutka", "Fizjoterapeutka"),
    ("ratownik", "Ratownik medyczny"),
    ("specjalista", "Specjalista"),
];

// Facility names too generic to say anything on a job card.
const PLACEHOLDER_FACILITIES: &[&str] = &["medicover", "lux med", "szpital"];

const MIN_MEANINGFUL_LENGTH: usize = 50;

/// A description carries its own summary only when it is long enough after
/// whitespace normalization and is not navigation or cookie boilerplate.
pub fn is_meaningful_description(description: Option<&str>) -> bool {
    let Some(description) = description else {
        return false;
    };
    let cleaned = description.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.chars().count() < MIN_MEANINGFUL_LENGTH {
        return false;
    }
    let lowered = cleaned.to_lowercase();
    !BOILERPLATE_RES.iter().any(|re| re.is_match(&lowered))
}

pub fn generate_summary(
    title: &str,
    description: Option<&str>,
    facility_name: &str,
    city: &str,
) -> String {
    if is_meaningful_description(description) {
        let cleaned: String = description
            .unwrap_or_default()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        return summarize_description(&cleaned);
    }

    let mut parts: Vec<String> = Vec::new();

    let title_lower = title.to_lowercase();
    let role_label = ROLE_LABELS
        .iter()
        .find(|(keyword, _)| title_lower.contains(keyword))
        .map(|(_, label)| (*label).to_string());
    match role_label {
        Some(label) => parts.push(label),
        None => parts.push(title.split_whitespace().take(3).collect::<Vec<_>>().join(" ")),
    }

    if !facility_name.is_empty()
        && !PLACEHOLDER_FACILITIES.contains(&facility_name.to_lowercase().as_str())
    {
        parts.push(format!("w {facility_name}"));
    } else {
        parts.push("w placówce medycznej".to_string());
    }

    if !city.is_empty() {
        parts.push(format!("w {city}"));
    }

    let mut summary = format!("{}.", parts.join(" "));

    if let Some(description) = description {
        if description.trim().chars().count() > 20 {
            let fragment = description.split_whitespace().take(15).collect::<Vec<_>>().join(" ");
            let fragment = truncate_chars(&fragment, 100);
            summary.push_str(&format!(" {fragment}..."));
        }
    }

    summary.trim().to_string()
}

/// First 2-3 sentences when the text splits cleanly, else the first 200
/// characters cut at a word boundary past position 150.
fn summarize_description(cleaned: &str) -> String {
    let sentences: Vec<&str> = SENTENCE_SPLIT_RE.split(cleaned).collect();
    if sentences.len() >= 2 {
        let mut summary = sentences
            .iter()
            .take(3)
            .map(|s| s.trim_end_matches(['.', '!', '?']))
            .collect::<Vec<_>>()
            .join(". ");
        if !summary.is_empty() && !summary.ends_with('.') {
            summary.push('.');
        }
        return summary.trim().to_string();
    }

    if cleaned.chars().count() <= 200 {
        return cleaned.to_string();
    }
    let mut summary = truncate_chars(cleaned, 200);
    if let Some(last_space) = summary.rfind(' ') {
        if summary[..last_space].chars().count() > 150 {
            summary.truncate(last_space);
        }
    }
    summary.push_str("...");
    summary.trim().to_string()
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

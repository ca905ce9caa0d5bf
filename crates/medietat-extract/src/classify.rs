//! Keyword classification: medical role taxonomy and Polish city detection.

use std::sync::LazyLock;

use medietat_core::MedicalRole;
use regex::Regex;

// Ordered most specific first; some keywords are substrings of others in
// running text, so midwife and paramedic terms must win over physician and
// nurse terms.
const ROLE_KEYWORD_GROUPS: &[(MedicalRole, &[&str])] = &[
    (MedicalRole::Polozna, &["położna", "położny", "midwife"]),
    (MedicalRole::Ratownik, &["ratownik medyczny", "ratownik", "paramedic"]),
    (MedicalRole::Lekarz, &["lekarz", "doktor", "doctor", "specjalista"]),
    (MedicalRole::Pielegniarka, &["pielęgniarka", "pielęgniarz", "nurse"]),
];

pub fn detect_role(text: &str) -> MedicalRole {
    let lowered = text.to_lowercase();
    for (role, keywords) in ROLE_KEYWORD_GROUPS {
        if keywords.iter().any(|kw| lowered.contains(kw)) {
            return *role;
        }
    }
    MedicalRole::Inny
}

pub fn contains_role_keyword(text: &str) -> bool {
    let lowered = text.to_lowercase();
    ROLE_KEYWORD_GROUPS
        .iter()
        .flat_map(|(_, keywords)| keywords.iter())
        .any(|kw| lowered.contains(kw))
}

/// Cities and towns the aggregator's sources realistically post for:
/// Tricity and the rest of Pomerania first, then larger Polish cities.
/// Multi-word names precede the single-word names they contain.
const POLISH_CITIES: &[&str] = &[
    "Starogard Gdański",
    "Pruszcz Gdański",
    "Nowy Dwór Gdański",
    "Krynica Morska",
    "Zielona Góra",
    "Bielsko-Biała",
    "Gdańsk",
    "Gdynia",
    "Sopot",
    "Wejherowo",
    "Rumia",
    "Reda",
    "Puck",
    "Hel",
    "Władysławowo",
    "Jastarnia",
    "Kartuzy",
    "Kościerzyna",
    "Tczew",
    "Malbork",
    "Kwidzyn",
    "Sztum",
    "Chojnice",
    "Człuchów",
    "Lębork",
    "Bytów",
    "Słupsk",
    "Ustka",
    "Elbląg",
    "Warszawa",
    "Kraków",
    "Łódź",
    "Wrocław",
    "Poznań",
    "Szczecin",
    "Bydgoszcz",
    "Lublin",
    "Białystok",
    "Katowice",
    "Toruń",
    "Rzeszów",
    "Kielce",
    "Olsztyn",
    "Opole",
    "Radom",
    "Częstochowa",
    "Gliwice",
    "Zabrze",
    "Sosnowiec",
    "Grudziądz",
    "Włocławek",
    "Płock",
    "Koszalin",
    "Kołobrzeg",
    "Piła",
    "Konin",
    "Kalisz",
    "Legnica",
    "Gniezno",
    "Brodnica",
];

static WORKPLACE_CITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:miejsce\s+pracy)\s*:?\s*(\p{Lu}[\p{L}\- ]+)").unwrap()
});
static DASH_CITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[–-]\s*(\p{Lu}[\p{L}\- ]+?)\s*[–-]").unwrap());

fn find_gazetteer_city(candidate: &str) -> Option<&'static str> {
    let lowered = candidate.trim().to_lowercase();
    POLISH_CITIES
        .iter()
        .find(|city| city.to_lowercase() == lowered)
        .copied()
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    let mut search_from = 0;
    while let Some(pos) = haystack[search_from..].find(needle) {
        let start = search_from + pos;
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphabetic());
        let after_ok = haystack[end..].chars().next().map_or(true, |c| !c.is_alphabetic());
        if before_ok && after_ok {
            return true;
        }
        search_from = end;
    }
    false
}

/// Finds a known Polish city in free text. Gazetteer word-boundary matching
/// first; the "miejsce pracy: City" and "– City –" patterns are fallbacks and
/// only accepted when the captured word is itself in the gazetteer.
pub fn extract_city(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    for city in POLISH_CITIES {
        if contains_word(&lowered, &city.to_lowercase()) {
            return Some(city);
        }
    }
    for pattern in [&*WORKPLACE_CITY_RE, &*DASH_CITY_RE] {
        if let Some(captures) = pattern.captures(text) {
            if let Some(city) = find_gazetteer_city(&captures[1]) {
                return Some(city);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paramedic_keywords_win_over_nurse_keywords() {
        let text = "Poszukujemy: ratownik medyczny lub pielęgniarka na SOR";
        assert_eq!(detect_role(text), MedicalRole::Ratownik);
    }

    #[test]
    fn midwife_wins_over_everything() {
        assert_eq!(
            detect_role("Położna / pielęgniarka do poradni lekarza rodzinnego"),
            MedicalRole::Polozna
        );
    }

    #[test]
    fn no_keyword_is_other_medical_personnel() {
        assert_eq!(detect_role("Technik sterylizacji"), MedicalRole::Inny);
        assert_eq!(detect_role("Lekarz internista"), MedicalRole::Lekarz);
    }

    #[test]
    fn city_matching_respects_word_boundaries() {
        assert_eq!(extract_city("Szpital w Gdańsku... Gdańsk"), Some("Gdańsk"));
        // Adjectival form is not the city name.
        assert_eq!(extract_city("powiat gdański"), None);
        assert_eq!(
            extract_city("Pielęgniarka - Starogard Gdański"),
            Some("Starogard Gdański")
        );
    }

    #[test]
    fn workplace_label_fallback_requires_gazetteer_hit() {
        assert_eq!(extract_city("Miejsce pracy: Gdynia"), Some("Gdynia"));
        assert_eq!(extract_city("Miejsce pracy: Xanadu"), None);
    }

    #[test]
    fn dash_delimited_city_requires_gazetteer_hit() {
        assert_eq!(
            extract_city("Szpital Specjalistyczny – Kościerzyna – Pielęgniarka"),
            Some("Kościerzyna")
        );
        assert_eq!(extract_city("Szpital – Przychodnia – Pielęgniarka"), None);
    }
}

//! Canonical keys derived from free-text source fields
//!
//! Families, genera, piles and pile groups are keyed by URL slugs;
//! characters are keyed by short names with their length-bound suffixes
//! removed; synonym names come through an authority stripper that drops
//! trailing authorship text while keeping one infraspecific epithet.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static SLUG_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").unwrap());
static FONT_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</?font[^>]*>").unwrap());

/// Infra-rank markers that may precede an infraspecific epithet
const CONNECTING_TERMS: &[&str] = &["subsp.", "ssp.", "var.", "subvar.", "f.", "forma", "subf."];

// Mojibake the Access export leaves in plant names; all become spaces.
const UNEXPECTED_CHARACTERS: &[char] = &['\u{a0}', '\u{2020}', '\u{20ac}', '\u{e2}'];

/// Two-letter matrix-column suffix to the pile it belongs to
pub const PILE_SUFFIXES: &[(&str, &str)] = &[
    ("ap", "Aquatic plants"),
    ("ca", "Carex"),
    ("co", "Composites"),
    ("eq", "Equisetaceae"),
    ("fe", "Ferns"),
    ("ly", "Lycophytes"),
    ("nm", "Non-orchid monocots"),
    ("om", "Orchid monocots"),
    ("po", "Poaceae"),
    ("rn", "Remaining non-monocots"),
    ("wa", "Woody angiosperms"),
    ("wg", "Woody gymnosperms"),
];

/// Lowercase two-letter state code to full state name
pub const STATE_NAMES: &[(&str, &str)] = &[
    ("ct", "Connecticut"),
    ("ma", "Massachusetts"),
    ("me", "Maine"),
    ("nh", "New Hampshire"),
    ("ri", "Rhode Island"),
    ("vt", "Vermont"),
];

/// URL-safe lowercase key for a name
pub fn slugify(text: &str) -> String {
    let cleaned = NON_SLUG.replace_all(text, "");
    let trimmed = cleaned.trim().to_lowercase();
    SLUG_SEPARATORS.replace_all(&trimmed, "-").into_owned()
}

/// Character short name with the `_min`/`_max` length markers removed,
/// so both bounds of a length character share one database record
pub fn character_short_name(raw: &str) -> String {
    raw.replace("_min", "").replace("_max", "")
}

/// Pile name for a matrix-column suffix, if the suffix is known
pub fn pile_name_for_suffix(suffix: &str) -> Option<&'static str> {
    PILE_SUFFIXES
        .iter()
        .find(|(s, _)| *s == suffix)
        .map(|(_, name)| *name)
}

/// Full state name for a lowercase code
pub fn state_name(code: &str) -> Option<&'static str> {
    STATE_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Strip the taxonomic authority out of a full plant name.
///
/// Keeps the genus and species epithet, then scans for an infra-rank
/// connecting term and keeps it plus the epithet that follows. When two
/// connecting terms abut (malformed source), the later one wins. The
/// epithet is truncated at the first character outside `[a-z-]` to
/// recover from missing-space artifacts.
pub fn strip_taxonomic_authority(full_name: &str) -> String {
    let scrubbed: String = full_name
        .chars()
        .map(|c| {
            if UNEXPECTED_CHARACTERS.contains(&c) {
                ' '
            } else {
                c
            }
        })
        .collect();

    let words: Vec<&str> = scrubbed.split(' ').collect();
    if words.len() < 2 {
        return String::new();
    }

    let mut name = vec![words[0].to_string(), words[1].trim_matches(',').to_string()];

    let mut i = 2;
    while i < words.len() {
        if CONNECTING_TERMS.contains(&words[i]) {
            let next = i + 1;
            if next < words.len() && CONNECTING_TERMS.contains(&words[next]) {
                // The next word is a connector too; skip ahead to it.
                i += 1;
                continue;
            }
            if next < words.len() {
                name.push(words[i].to_string());
                let epithet = words[next];
                let cut = epithet
                    .char_indices()
                    .find(|(_, c)| !(c.is_ascii_lowercase() || *c == '-'))
                    .map(|(idx, _)| idx)
                    .unwrap_or(epithet.len());
                name.push(epithet[..cut].to_string());
            }
            break;
        }
        i += 1;
    }

    name.join(" ")
}

/// Parent species name of an infraspecific record: everything before the
/// first `var.` or `ssp.` marker. Unchanged input means the record is
/// already at species level.
pub fn extract_species_name(name: &str) -> &str {
    if let Some(idx) = name.find("var.") {
        return name[..idx].trim();
    }
    if let Some(idx) = name.find("ssp.") {
        return name[..idx].trim();
    }
    name
}

/// Clean up HTML ugliness arising from the Access rich-text export
pub fn clean_access_html(html: &str) -> String {
    let without_nbsp = html.replace("&nbsp;", "");
    FONT_TAG.replace_all(&without_nbsp, "").into_owned()
}

/// First letter uppercased, everything else lowercased
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Woody Angiosperms"), "woody-angiosperms");
        assert_eq!(slugify("  Carex  "), "carex");
        assert_eq!(slugify("St. John's-wort"), "st-johns-wort");
    }

    #[test]
    fn test_character_short_name() {
        assert_eq!(character_short_name("leaf_length_min_ca"), "leaf_length_ca");
        assert_eq!(character_short_name("leaf_length_max_ca"), "leaf_length_ca");
        assert_eq!(character_short_name("leaf_shape_ca"), "leaf_shape_ca");
    }

    #[test]
    fn test_strip_authority_binomial() {
        assert_eq!(
            strip_taxonomic_authority("Carex vulpinoidea Michx."),
            "Carex vulpinoidea"
        );
    }

    #[test]
    fn test_strip_authority_keeps_variety() {
        assert_eq!(
            strip_taxonomic_authority("Carex vulpinoidea var. ambigua Boott"),
            "Carex vulpinoidea var. ambigua"
        );
    }

    #[test]
    fn test_strip_authority_trailing_comma_on_species() {
        assert_eq!(
            strip_taxonomic_authority("Acer rubrum, sensu lato"),
            "Acer rubrum"
        );
    }

    #[test]
    fn test_strip_authority_double_connector_uses_later_term() {
        assert_eq!(
            strip_taxonomic_authority("Poa pratensis ssp. var. angustifolia"),
            "Poa pratensis var. angustifolia"
        );
    }

    #[test]
    fn test_strip_authority_truncates_malformed_epithet() {
        // Missing space after the epithet glues the authority on.
        assert_eq!(
            strip_taxonomic_authority("Carex flava var. fertilisFernald"),
            "Carex flava var. fertilis"
        );
    }

    #[test]
    fn test_strip_authority_connector_without_epithet() {
        assert_eq!(
            strip_taxonomic_authority("Carex flava var."),
            "Carex flava"
        );
    }

    #[test]
    fn test_strip_authority_single_word() {
        assert_eq!(strip_taxonomic_authority("Carex"), "");
    }

    #[test]
    fn test_extract_species_name() {
        assert_eq!(
            extract_species_name("Acer rubrum var. trilobum"),
            "Acer rubrum"
        );
        assert_eq!(
            extract_species_name("Acer saccharum ssp. nigrum"),
            "Acer saccharum"
        );
        assert_eq!(extract_species_name("Acer rubrum"), "Acer rubrum");
    }

    #[test]
    fn test_clean_access_html() {
        assert_eq!(
            clean_access_html("Leaves opposite.&nbsp; <font color=\"red\">Rare</font>."),
            "Leaves opposite. Rare."
        );
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("acer rubrum"), "Acer rubrum");
        assert_eq!(capitalize("ACER RUBRUM"), "Acer rubrum");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_state_and_pile_lookups() {
        assert_eq!(state_name("ma"), Some("Massachusetts"));
        assert_eq!(state_name("ny"), None);
        assert_eq!(pile_name_for_suffix("ca"), Some("Carex"));
        assert_eq!(pile_name_for_suffix("zz"), None);
    }
}

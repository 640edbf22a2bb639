//! Conservation and distribution status rules
//!
//! `state_status` turns a taxon's per-state facts into the comma-joined
//! status string stored on the taxon record. The precedence table ranks
//! county-level distribution statuses so that subspecies records can roll
//! up into their parent species when they carry stronger information.

/// The six New England state codes, in column order
pub const STATES: [&str; 6] = ["CT", "MA", "ME", "NH", "RI", "VT"];

// Precedence of distribution status to be assigned when a species has
// differing status per subspecies or variety. Higher values override lower.
const STATUS_PRECEDENCE: &[(&str, u32)] = &[
    ("Species noxious", 13),
    ("Species present in state and exotic", 12),
    ("Species exotic and present", 11),
    ("Species waif", 10),
    ("Species present in state and native", 9),
    ("Species present and not rare", 8),
    ("Species native, but adventive in state", 7),
    ("Species present and rare", 6),
    ("Species extirpated (historic)", 5),
    ("Species extinct", 4),
    ("Species not present in state", 3),
    ("Species eradicated", 2),
    ("Questionable Presence (cross-hatched)", 1),
    ("", 0),
];

/// Precedence rank of a distribution status string; unknown strings rank 0
pub fn status_rank(status: &str) -> u32 {
    STATUS_PRECEDENCE
        .iter()
        .find(|(s, _)| *s == status)
        .map(|(_, rank)| *rank)
        .unwrap_or(0)
}

/// Split a pipe-delimited state list, dropping embedded spaces.
/// An empty field yields no states at all.
pub fn split_states(field: &str) -> Vec<String> {
    if field.trim().is_empty() {
        return Vec::new();
    }
    field
        .replace(' ', "")
        .split('|')
        .map(str::to_string)
        .collect()
}

/// Status string for one state, from the taxon's distribution list and
/// per-state conservation facts.
///
/// Token order is fixed: presence, then at most one conservation
/// qualifier, then invasive, then extirpated, then prohibited. The
/// extinct/extirpated code clears a bare present/absent first so that
/// "extirpated" appears alone in that case, and prohibited-from-sale
/// applies even to absent plants.
pub fn state_status(
    state_code: &str,
    distribution: &[&str],
    conservation_status_code: &str,
    is_invasive: bool,
    is_prohibited: bool,
) -> String {
    let mut status: Vec<&str> = vec!["absent"];

    if distribution.iter().any(|s| *s == state_code) {
        status = vec!["present"];

        // Most further status information applies only to plants that
        // are present.
        match conservation_status_code {
            "E" => status.push("endangered"),
            "T" => status.push("threatened"),
            "SC" | "SC*" => status.push("special concern"),
            "H" => status.push("historic"),
            "C" | "WL" | "W" | "Ind" => status.push("rare"),
            _ => {}
        }

        if is_invasive {
            status.push("invasive");
        }
    }

    if conservation_status_code == "X" {
        if status == ["present"] || status == ["absent"] {
            status.clear();
        }
        status.push("extirpated");
    }

    if is_prohibited {
        status.push("prohibited");
    }

    status.join(", ")
}

//! Look-alike plant import

use std::path::Path;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use herbarium_core::Reporter;
use herbarium_db::{Database, Value};

use crate::rows::open_csv;

// A combined tip looks like "Genus species: how to tell Genus species2:
// another tip"; each two-word name prefix starts a new pair.
static NAME_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+ \w+):").unwrap());

/// Load look-alike plants from a CSV file
pub fn import_lookalikes(db: &Database, path: &Path, reporter: &dyn Reporter) -> Result<()> {
    reporter.info(&format!(
        "Loading look-alike plants from file: {}",
        path.display()
    ));

    let taxon_map = db.map("taxon", &["scientific_name"], "id")?;
    let mut lookalike = db.table("lookalike", &["taxon_id", "lookalike_scientific_name"]);

    for row in open_csv(path)? {
        let row = row?;
        if row.field("lookalike_tips").is_empty() {
            continue;
        }

        let taxon_id = match taxon_map.get(&Value::from(row.field("scientific__name"))) {
            Some(id) => id.clone(),
            None => {
                reporter.error(&format!(
                    "Unknown taxon: {:?}",
                    row.field("scientific__name")
                ));
                continue;
            }
        };

        // Clean up Windows dash characters.
        let tips = row.field("lookalike_tips").replace('\u{2013}', "-");

        for (name, characteristic) in split_tips(&tips) {
            lookalike
                .get(&[taxon_id.clone(), name.into()])
                .set("lookalike_characteristic", characteristic);
        }
    }

    lookalike.save(false)?;
    Ok(())
}

/// Split a combined tip string into (look-alike name, characteristic)
/// pairs; text before the first name prefix is discarded
fn split_tips(tips: &str) -> Vec<(&str, &str)> {
    let matches: Vec<_> = NAME_PREFIX.captures_iter(tips).collect();
    let mut pairs = Vec::with_capacity(matches.len());
    for (i, captures) in matches.iter().enumerate() {
        let name = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        let whole = captures.get(0).unwrap();
        let end = matches
            .get(i + 1)
            .map(|next| next.get(0).unwrap().start())
            .unwrap_or(tips.len());
        let characteristic = tips[whole.end()..end].trim();
        pairs.push((name, characteristic));
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_tips_single_pair() {
        let pairs = split_tips("Carex lurida: perigynia inflated");
        assert_eq!(pairs, vec![("Carex lurida", "perigynia inflated")]);
    }

    #[test]
    fn test_split_tips_multiple_pairs() {
        let pairs = split_tips(
            "Carex lurida: perigynia inflated Carex baileyi: narrower spikes",
        );
        assert_eq!(
            pairs,
            vec![
                ("Carex lurida", "perigynia inflated"),
                ("Carex baileyi", "narrower spikes"),
            ]
        );
    }

    #[test]
    fn test_split_tips_without_prefix() {
        assert!(split_tips("no names here").is_empty());
    }
}

//! Taxon character-value matrix import
//!
//! Each matrix file carries one column per (character, pile) pair, with
//! case-significant column names: `_min`/`_max` columns contribute the
//! bounds of a range value, everything else is pipe-delimited discrete
//! values. A range value is only emitted once both bounds have been seen
//! for the taxon and character, however many rows apart they arrive.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use anyhow::Result;

use herbarium_core::Reporter;
use herbarium_db::{Database, Value};

use crate::normalize::character_short_name;
use crate::rows::open_csv_exact;

use super::characters::pile_suffix_map;

/// Load taxon character values from one or more matrix CSV files
pub fn import_taxon_character_values(
    db: &Database,
    paths: &[PathBuf],
    reporter: &dyn Reporter,
) -> Result<()> {
    let pile_map = pile_suffix_map(db)?;
    let taxon_map = db.map("taxon", &["scientific_name"], "id")?;
    let character_map = db.map("character", &["short_name"], "id")?;
    let cv_map = db.map("character_value", &["character_id", "value_str"], "id")?;

    let mut cv_table = db.table("character_value", &["character_id", "value_min", "value_max"]);
    let mut tcv_table = db.table("taxon_character_value", &["taxon_id", "character_value_id"]);

    let mut bad_float_values: BTreeSet<String> = BTreeSet::new();
    let mut unknown_characters: BTreeSet<String> = BTreeSet::new();
    let mut unknown_character_values: BTreeSet<String> = BTreeSet::new();
    let mut incomplete_ranges: BTreeSet<String> = BTreeSet::new();

    for path in paths {
        reporter.info(&format!("Loading {}", path.display()));

        // Track min/max sightings per taxon and character so a range value
        // is only created once both bounds are in hand, even when they
        // arrive on different rows of the file.
        let mut length_pairs: HashMap<(Value, String), (Option<f64>, Option<f64>)> =
            HashMap::new();

        // Column-name case is significant here; do not lowercase.
        for row in open_csv_exact(path)? {
            let row = row?;

            let taxon_id = match taxon_map.get(&Value::from(row.field("Scientific__Name"))) {
                Some(id) => id.clone(),
                None => {
                    reporter.error(&format!(
                        "Unknown taxon: {:?}",
                        row.field("Scientific__Name")
                    ));
                    continue;
                }
            };

            for (column, v) in row.iter() {
                let v = v.trim();
                if v.is_empty() {
                    continue;
                }
                let suffix = if column.len() >= 3 && column.is_char_boundary(column.len() - 3) {
                    &column[column.len() - 3..]
                } else {
                    continue;
                };
                if !pile_map.contains_key(suffix) {
                    continue;
                }

                let short_name = character_short_name(column);
                let character_id = match character_map.get(&Value::from(short_name.as_str())) {
                    Some(id) => id.clone(),
                    None => {
                        unknown_characters.insert(short_name);
                        continue;
                    }
                };

                let lowered = column.to_lowercase();
                let is_min = lowered.contains("_min");
                let is_max = lowered.contains("_max");

                if is_min || is_max {
                    if v == "n/a" {
                        continue;
                    }
                    let numv = match v.parse::<f64>() {
                        Ok(n) => n,
                        Err(_) => {
                            bad_float_values.insert(v.to_string());
                            continue;
                        }
                    };
                    let pair = length_pairs
                        .entry((taxon_id.clone(), short_name))
                        .or_default();
                    if is_min {
                        pair.0 = Some(numv);
                    } else {
                        pair.1 = Some(numv);
                    }
                } else {
                    // Discrete values resolve against the already-saved
                    // character values.
                    for value_str in v.split('|') {
                        let value_str = value_str.trim();
                        let cv_key =
                            Value::composite([character_id.clone(), value_str.into()]);
                        match cv_map.get(&cv_key) {
                            Some(cv_id) => {
                                tcv_table.get(&[taxon_id.clone(), cv_id.clone()]);
                            }
                            None => {
                                unknown_character_values
                                    .insert(format!("({}, {})", short_name, value_str));
                            }
                        }
                    }
                }
            }
        }

        // Both bounds of every complete range have now been seen.
        for ((taxon_id, short_name), (vmin, vmax)) in length_pairs {
            let (vmin, vmax) = match (vmin, vmax) {
                (Some(min), Some(max)) => (min, max),
                _ => {
                    incomplete_ranges.insert(short_name);
                    continue;
                }
            };
            let character_id = character_map[&Value::from(short_name.as_str())].clone();
            cv_table
                .get(&[character_id.clone(), vmin.into(), vmax.into()])
                .set("friendly_text", "");
            tcv_table.get(&[
                taxon_id,
                Value::composite([character_id, vmin.into(), vmax.into()]),
            ]);
        }
    }

    for s in &bad_float_values {
        reporter.debug(&format!("Bad floating-point value: {}", s));
    }
    for s in &unknown_characters {
        reporter.debug(&format!("Unknown character: {}", s));
    }
    for s in &unknown_character_values {
        reporter.debug(&format!("Unknown character value: {}", s));
    }
    for s in &incomplete_ranges {
        reporter.debug(&format!("Range character missing a bound: {}", s));
    }

    cv_table.save(false)?;

    // A composite map lets ids we already hold pass through unscathed
    // while the (character, min, max) triples get dereferenced.
    let mut cv_map = db.map("character_value", &["id"], "id")?;
    let range_map = db.map(
        "character_value",
        &["character_id", "value_min", "value_max"],
        "id",
    )?;
    cv_map.extend(range_map);

    tcv_table.replace("character_value_id", &cv_map)?;
    // Matrices arrive per pile; a later pile's run must not wipe an
    // earlier pile's links.
    tcv_table.save(false)?;

    Ok(())
}

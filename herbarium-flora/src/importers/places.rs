//! Habitat and state-distribution filter characters
//!
//! Builds the "place" character group and its three characters, then
//! turns the habitat and distribution columns of the taxa file into
//! character values linked to each taxon.

use std::path::Path;

use anyhow::Result;
use rusqlite::OptionalExtension;

use herbarium_core::Reporter;
use herbarium_db::{Database, Value};

use crate::normalize::state_name;
use crate::rows::open_csv;

const PLACE_CHARACTERS: [(&str, &str, &str); 3] = [
    (
        "habitat",
        "Specific habitat",
        "What specific kind of habitat is your plant found in?",
    ),
    (
        "habitat_general",
        "Habitat",
        "What kind of habitat is your plant found in?",
    ),
    (
        "state_distribution",
        "New England state",
        "In which New England state did you find the plant?",
    ),
];

/// Load habitat and state data from the taxa CSV file
pub fn import_places(db: &Database, path: &Path, reporter: &dyn Reporter) -> Result<()> {
    reporter.info("Setting up place characters and values");

    let mut character_group_table = db.table("character_group", &["name"]);
    character_group_table.get(&["place".into()]);
    character_group_table.save(false)?;

    let character_group_map = db.map("character_group", &["name"], "id")?;
    let character_group_id = character_group_map[&Value::from("place")].clone();

    let mut character_table = db.table("character", &["short_name"]);
    for (short_name, friendly_name, question) in PLACE_CHARACTERS {
        character_table
            .get(&[short_name.into()])
            .set("name", friendly_name)
            .set("friendly_name", friendly_name)
            .set("character_group_id", character_group_id.clone())
            .set("value_type", "TEXT")
            .set("unit", "")
            .set("ease_of_observability", 1)
            .set("question", question)
            .set("hint", "");
    }
    character_table.save(false)?;

    // Go through all of the taxa and create character values.
    let character_map = db.map("character", &["short_name"], "id")?;
    let taxon_map = db.map("taxon", &["scientific_name"], "id")?;
    let habitat_id = character_map[&Value::from("habitat")].clone();
    let habitat_general_id = character_map[&Value::from("habitat_general")].clone();
    let state_distribution_id = character_map[&Value::from("state_distribution")].clone();

    let mut character_value_table = db.table("character_value", &["character_id", "value_str"]);
    let mut tcv_table = db.table("taxon_character_value", &["taxon_id", "character_value_id"]);

    for row in open_csv(path)? {
        let row = row?;

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

        // (character_id, value_str, friendly_text) triples to insert.
        let mut cvfs: Vec<(Value, String, String)> = Vec::new();

        for habitat in row.field("habitat").to_lowercase().split("| ") {
            let friendly = friendly_habitat_name(db, habitat, reporter)?;
            cvfs.push((habitat_id.clone(), habitat.to_string(), friendly));
        }

        for habitat in row.field("habitat_general").to_lowercase().split("| ") {
            cvfs.push((
                habitat_general_id.clone(),
                habitat.to_string(),
                habitat.to_string(),
            ));
        }

        for state_code in row.field("distribution").to_lowercase().split("| ") {
            let state = state_name(state_code).unwrap_or("");
            cvfs.push((
                state_distribution_id.clone(),
                state.to_string(),
                String::new(),
            ));
        }

        for (character_id, value_str, friendly_text) in cvfs {
            if value_str.is_empty() {
                continue;
            }
            character_value_table
                .get(&[character_id.clone(), value_str.as_str().into()])
                .set("friendly_text", friendly_text.as_str());
            tcv_table.get(&[
                taxon_id.clone(),
                Value::composite([character_id, value_str.as_str().into()]),
            ]);
        }
    }

    character_value_table.save(false)?;
    let cv_map = db.map("character_value", &["character_id", "value_str"], "id")?;
    tcv_table.replace("character_value_id", &cv_map)?;
    tcv_table.save(false)?;

    Ok(())
}

/// Lowercased friendly name for a habitat, empty when the habitat table
/// does not know it
fn friendly_habitat_name(
    db: &Database,
    habitat_name: &str,
    reporter: &dyn Reporter,
) -> Result<String> {
    if habitat_name.is_empty() {
        return Ok(String::new());
    }
    let friendly: Option<String> = db
        .connection()
        .query_row(
            "SELECT friendly_name FROM habitat WHERE lower(name) = lower(?)",
            [habitat_name],
            |r| r.get(0),
        )
        .optional()?;
    match friendly {
        Some(name) => Ok(name.to_lowercase()),
        None => {
            reporter.error(&format!("Habitat does not exist: {}", habitat_name));
            Ok(String::new())
        }
    }
}

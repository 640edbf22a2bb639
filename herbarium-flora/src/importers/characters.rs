//! Character, character-group and character-value imports

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use herbarium_core::Reporter;
use herbarium_db::{Database, Value};

use crate::normalize::{
    capitalize, character_short_name, clean_access_html, pile_name_for_suffix, slugify,
    PILE_SUFFIXES,
};
use crate::rows::open_csv;
use crate::store::{key_basename, ObjectStore};

static PILE_SUFFIX_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"_[a-z]{2}$").unwrap());

/// Storage directories for the illustration uploads
const CHARACTER_IMAGE_DIR: &str = "character-illustrations";
const CHARACTER_VALUE_IMAGE_DIR: &str = "character-value-images";

/// Map from a `_xx` column suffix to the id of the matching pile,
/// restricted to piles actually present in the database
pub(crate) fn pile_suffix_map(db: &Database) -> Result<HashMap<String, Value>> {
    let pile_map = db.map("pile", &["slug"], "id")?;
    let mut map = HashMap::new();
    for (suffix, name) in PILE_SUFFIXES {
        if let Some(id) = pile_map.get(&Value::from(slugify(name).as_str())) {
            map.insert(format!("_{}", suffix), id.clone());
        }
    }
    Ok(map)
}

/// Load characters from a CSV file.
///
/// Rows without an underscore in the character column are family rows and
/// are skipped. A `_min`/`_max` marker makes the character a LENGTH
/// character with a unit; the trailing two-letter suffix assigns it to a
/// pile.
pub fn import_characters(db: &Database, path: &Path, reporter: &dyn Reporter) -> Result<()> {
    reporter.info(&format!("Loading characters from file: {}", path.display()));

    let pile_map = pile_suffix_map(db)?;
    let mut character_group_table = db.table("character_group", &["name"]);
    let mut character_table = db.table("character", &["short_name"]);

    for row in open_csv(path)? {
        let row = row?;
        let character_name = row.field("character");
        if !character_name.contains('_') {
            continue;
        }

        let lowered = character_name.to_lowercase();
        let is_length = lowered.contains("_min") || lowered.contains("_max");
        let short_name = character_short_name(character_name);

        let (value_type, unit) = if is_length {
            ("LENGTH", row.field("units"))
        } else {
            ("TEXT", "")
        };

        let suffix = tail_suffix(character_name);
        let pile_id = suffix
            .and_then(|s| pile_map.get(s))
            .cloned()
            .unwrap_or(Value::Null);

        character_group_table.get(&[row.field("character_group").into()]);

        let ease = match row.field("ease_of_observability").parse::<i64>() {
            Ok(n) => n,
            Err(_) => {
                reporter.error(&format!(
                    "Bad ease-of-observability value: {:?}",
                    row.field("ease_of_observability")
                ));
                10
            }
        };

        let name = derive_character_name(&short_name);
        let friendly_name = if row.field("filter_label").is_empty() {
            name.clone()
        } else {
            row.field("filter_label").to_string()
        };

        character_table
            .get(&[short_name.as_str().into()])
            .set("name", name.as_str())
            .set("friendly_name", friendly_name.as_str())
            .set("character_group_id", row.field("character_group"))
            .set("pile_id", pile_id)
            .set("value_type", value_type)
            .set("unit", unit)
            .set("ease_of_observability", ease)
            .set("question", row.field("friendly_text"))
            .set("hint", row.field("hint"));
    }

    character_group_table.save(false)?;
    let character_group_map = db.map("character_group", &["name"], "id")?;
    character_table.replace("character_group_id", &character_group_map)?;
    character_table.save(false)?;
    Ok(())
}

/// Load discrete character values from a CSV file
pub fn import_character_values(db: &Database, path: &Path, reporter: &dyn Reporter) -> Result<()> {
    reporter.info(&format!(
        "Loading character values from: {}",
        path.display()
    ));

    let character_map = db.map("character", &["short_name"], "id")?;
    let mut character_value_table = db.table("character_value", &["character_id", "value_str"]);

    for row in open_csv(path)? {
        let row = row?;
        let character_name = row.field("character");
        if character_name == "family" {
            continue;
        }
        if !character_name.contains('_') {
            reporter.warning(&format!("ignoring {:?}", character_name));
            continue;
        }

        let pile_suffix = character_name.rsplit('_').next().unwrap_or("");
        if pile_name_for_suffix(pile_suffix).is_none() {
            reporter.error(&format!(
                "Character has bad pile suffix: {:?}",
                character_name
            ));
            continue;
        }

        let short_name = character_short_name(character_name);
        let character_id = match character_map.get(&Value::from(short_name.as_str())) {
            Some(id) => id.clone(),
            None => {
                reporter.error(&format!("Bad character: {:?}", short_name));
                continue;
            }
        };

        character_value_table
            .get(&[character_id, row.field("character_value").into()])
            .set(
                "friendly_text",
                clean_access_html(row.field("friendly_text")),
            );
    }

    character_value_table.save(false)?;
    Ok(())
}

/// Reconcile character illustration paths against the store listing
pub fn import_character_images(
    db: &Database,
    store: &dyn ObjectStore,
    path: &Path,
    reporter: &dyn Reporter,
) -> Result<()> {
    reporter.info("Fetching the list of character images");
    let image_names: HashSet<String> = store
        .list(CHARACTER_IMAGE_DIR)?
        .iter()
        .map(|key| key_basename(key).to_string())
        .collect();

    reporter.info("Saving character image paths to database");
    let conn = db.connection();
    let mut count = 0;

    for row in open_csv(path)? {
        let row = row?;
        let image_name = row.field("image_name");
        if image_name.is_empty() {
            continue;
        }
        let short_name = character_short_name(row.field("character"));

        if !image_names.contains(image_name) {
            reporter.error(&format!("Missing character image: {}", image_name));
            conn.execute(
                "UPDATE character SET image = '' WHERE short_name = ?",
                [&short_name],
            )?;
            continue;
        }

        let changed = conn.execute(
            "UPDATE character SET image = ? WHERE short_name = ?",
            [&format!("{}/{}", CHARACTER_IMAGE_DIR, image_name), &short_name],
        )?;
        if changed == 0 {
            reporter.error(&format!("Character does not exist: {:?}", short_name));
            continue;
        }
        count += 1;
    }

    reporter.info(&format!("Done loading {} character images", count));
    Ok(())
}

/// Reconcile character-value image paths against the store listing
pub fn import_character_value_images(
    db: &Database,
    store: &dyn ObjectStore,
    path: &Path,
    reporter: &dyn Reporter,
) -> Result<()> {
    reporter.info("Fetching the list of character-value images");
    let image_names: HashSet<String> = store
        .list(CHARACTER_VALUE_IMAGE_DIR)?
        .iter()
        .map(|key| key_basename(key).to_string())
        .collect();

    reporter.info("Saving character-value image paths to database");
    let character_map = db.map("character", &["short_name"], "id")?;
    let conn = db.connection();
    let mut count = 0;

    for row in open_csv(path)? {
        let row = row?;
        let image_name = row.field("image_name");
        if image_name.is_empty() {
            continue;
        }
        let character_name = row.field("character");
        if character_name == "family" {
            continue;
        }
        if !character_name.contains('_') {
            reporter.warning(&format!("Character lacks pile suffix: {:?}", character_name));
            continue;
        }
        let pile_suffix = character_name.rsplit('_').next().unwrap_or("");
        if pile_name_for_suffix(pile_suffix).is_none() {
            reporter.warning(&format!("Character has bad pile suffix: {:?}", character_name));
            continue;
        }

        let short_name = character_short_name(character_name);
        let character_id = match character_map.get(&Value::from(short_name.as_str())) {
            Some(id) => id.clone(),
            None => {
                reporter.warning(&format!("Character does not exist: {:?}", short_name));
                continue;
            }
        };

        if !image_names.contains(image_name) {
            reporter.error(&format!("Character value image missing: {}", image_name));
            continue;
        }

        let changed = conn.execute(
            "UPDATE character_value SET image = ? WHERE character_id = ? AND value_str = ?",
            rusqlite::params![
                format!("{}/{}", CHARACTER_VALUE_IMAGE_DIR, image_name),
                character_id,
                row.field("character_value"),
            ],
        )?;
        if changed == 0 {
            reporter.warning(&format!(
                "Character value does not exist: ({}, {:?})",
                short_name,
                row.field("character_value")
            ));
            continue;
        }
        count += 1;
    }

    reporter.info(&format!("Done loading {} character-value images", count));
    Ok(())
}

/// Character name derived from a short name: pile suffix dropped,
/// underscores to spaces, first letter capitalized
fn derive_character_name(short_name: &str) -> String {
    let trimmed = PILE_SUFFIX_TAIL.replace(short_name, "");
    capitalize(&trimmed.replace('_', " "))
}

/// Final three characters of a column name, when it is long enough to
/// carry a pile suffix
fn tail_suffix(name: &str) -> Option<&str> {
    if name.len() >= 3 && name.is_char_boundary(name.len() - 3) {
        Some(&name[name.len() - 3..])
    } else {
        None
    }
}

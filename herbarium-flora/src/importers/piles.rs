//! Pile-group and pile imports

use std::path::Path;

use anyhow::Result;

use herbarium_core::Reporter;
use herbarium_db::{Database, Value};

use crate::normalize::{clean_access_html, slugify};
use crate::rows::open_csv;

/// Load pile groups from a CSV file
pub fn import_pile_groups(db: &Database, path: &Path, reporter: &dyn Reporter) -> Result<()> {
    reporter.info(&format!("Setting up pile groups from: {}", path.display()));

    let mut pile_group = db.table("pile_group", &["slug"]);
    for row in open_csv(path)? {
        let row = row?;
        pile_group
            .get(&[slugify(row.field("name")).into()])
            .set("description", "")
            .set("friendly_name", row.field("friendly_name"))
            .set("friendly_title", row.field("friendly_title"))
            .set(
                "key_characteristics",
                clean_access_html(row.field("key_characteristics")),
            )
            .set("name", title_case(row.field("name")))
            .set(
                "notable_exceptions",
                clean_access_html(row.field("notable_exceptions")),
            );
    }
    pile_group.save(false)?;
    Ok(())
}

/// Load piles from a CSV file
pub fn import_piles(db: &Database, path: &Path, reporter: &dyn Reporter) -> Result<()> {
    reporter.info(&format!("Setting up piles from: {}", path.display()));

    let pile_group_map = db.map("pile_group", &["slug"], "id")?;
    let mut pile = db.table("pile", &["slug"]);

    for row in open_csv(path)? {
        let row = row?;
        let name = row.field("name");
        // "all" and "unused" are bookkeeping rows in the export.
        if name.eq_ignore_ascii_case("all") || name.eq_ignore_ascii_case("unused") {
            continue;
        }

        let group_slug = slugify(row.field("pile_group"));
        let pile_group_id = match pile_group_map.get(&Value::from(group_slug.as_str())) {
            Some(id) => id.clone(),
            None => {
                reporter.error(&format!(
                    "Unknown pile group {:?} for pile {:?}",
                    row.field("pile_group"),
                    name
                ));
                continue;
            }
        };

        pile.get(&[slugify(name).into()])
            .set("name", title_case(name))
            .set("pile_group_id", pile_group_id)
            .set("friendly_name", row.field("friendly_name"))
            .set("friendly_title", row.field("friendly_title"))
            .set("description", row.field("description"))
            .set(
                "key_characteristics",
                clean_access_html(row.field("key_characteristics")),
            )
            .set(
                "notable_exceptions",
                clean_access_html(row.field("notable_exceptions")),
            );
    }
    pile.save(false)?;
    Ok(())
}

/// Uppercase the first letter of every space-separated word
fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("woody angiosperms"), "Woody Angiosperms");
        assert_eq!(title_case("carex"), "Carex");
        assert_eq!(title_case("NON-ORCHID monocots"), "Non-orchid Monocots");
    }
}

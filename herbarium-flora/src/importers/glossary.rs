//! Glossary term import and image reconciliation

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;

use herbarium_core::Reporter;
use herbarium_db::Database;

use crate::rows::open_csv;
use crate::store::{key_basename, ObjectStore};

const GLOSSARY_IMAGE_DIR: &str = "glossary-images";

/// Load glossary terms from a CSV file
pub fn import_glossary(db: &Database, path: &Path, reporter: &dyn Reporter) -> Result<()> {
    reporter.info(&format!("Loading glossary from file: {}", path.display()));

    let mut glossary_term = db.table("glossary_term", &["term"]);
    for row in open_csv(path)? {
        let row = row?;
        // A definition that is empty or merely repeats the term carries
        // no information.
        if row.field("definition").is_empty() || row.field("definition") == row.field("term") {
            continue;
        }

        glossary_term
            .get(&[row.field("term").into()])
            .set("hint", "")
            .set("lay_definition", row.field("definition"))
            .set("question_text", "")
            .set("visible", true)
            .set(
                "is_highlighted",
                row.field("is_highlighted").eq_ignore_ascii_case("true"),
            );
    }
    glossary_term.save(false)?;
    Ok(())
}

/// Reconcile glossary illustration paths against the store listing
pub fn import_glossary_images(
    db: &Database,
    store: &dyn ObjectStore,
    path: &Path,
    reporter: &dyn Reporter,
) -> Result<()> {
    reporter.info("Scanning glossary images in storage");
    let image_names: HashSet<String> = store
        .list(GLOSSARY_IMAGE_DIR)?
        .iter()
        .map(|key| key_basename(key).to_string())
        .collect();

    reporter.info("Saving glossary images to table");
    let conn = db.connection();
    let mut count = 0;

    for row in open_csv(path)? {
        let row = row?;
        if row.field("definition").is_empty() || row.field("definition") == row.field("term") {
            continue;
        }

        let image_name = row.field("illustration");
        if image_name.is_empty() {
            continue;
        }
        if !image_names.contains(image_name) {
            reporter.error(&format!("Unknown image: {}", image_name));
            continue;
        }

        let changed = conn.execute(
            "UPDATE glossary_term SET image = ? WHERE term = ?",
            [
                &format!("{}/{}", GLOSSARY_IMAGE_DIR, image_name),
                row.field("term"),
            ],
        )?;
        if changed == 0 {
            reporter.warning(&format!("Glossary term does not exist: {:?}", row.field("term")));
            continue;
        }
        count += 1;
    }

    reporter.info(&format!("Saved {} glossary images to table", count));
    Ok(())
}

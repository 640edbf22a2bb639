//! Taxon and home-page image imports from the storage manifests
//!
//! Taxon images arrive as a gzip-compressed flat listing of object paths.
//! Filenames follow the grammar
//! `genus-species[-infraspecific]-TYPE-PHOTOGRAPHER.ext`, where TYPE is
//! the first two-character token after any longer infraspecific tokens.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;

use herbarium_core::Reporter;
use herbarium_db::{Database, Value};

use crate::normalize::capitalize;
use crate::rows::open_csv;
use crate::store::{key_basename, ObjectStore};

const TAXON_IMAGE_MANIFEST: &str = "ls-taxon-images.gz";
const HOME_PAGE_IMAGE_DIR: &str = "home-page-images";
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "gif", "png", "tif"];

/// Load the taxon image listing from storage.
///
/// The image-categories CSV maps (pile, type code) to a human-readable
/// image-type name and doubles as a check that every image's type is
/// recognized. The first image seen for a (taxon, type) pair gets rank 1
/// and every later one rank 2; downstream consumers rely on that binary
/// distinction, so it is not a true sequential rank.
pub fn import_taxon_images(
    db: &Database,
    store: &dyn ObjectStore,
    image_categories_csv: &Path,
    reporter: &dyn Reporter,
) -> Result<()> {
    let mut content_image_table =
        db.table("content_image", &["object_id", "content_type", "image"]);
    let mut image_type_table = db.table("image_type", &["name"]);
    let pile_names = db.map("pile", &["id"], "name")?;
    let taxon_ids = db.map("taxon", &["scientific_name"], "id")?;
    let taxon_pile_map = db.manymap("pile_species", "taxon_id", "pile_id")?;

    let mut taxon_image_types: HashMap<(String, String), String> = HashMap::new();
    for row in open_csv(image_categories_csv)? {
        let row = row?;
        // lower() matters: the official pile name and its name here are
        // often case-mismatched.
        let key = (
            row.field("pile").to_lowercase(),
            row.field("code").to_string(),
        );
        // The category looks like "bark, ba"; cut at the last comma.
        let category = row.field("category");
        let name = category
            .rsplit_once(',')
            .map(|(head, _)| head)
            .unwrap_or(category);
        taxon_image_types.insert(key, name.to_string());
    }

    reporter.info("Scanning storage for taxon images");
    let manifest = store
        .fetch(TAXON_IMAGE_MANIFEST)
        .context("failed to fetch the taxon image manifest")?;
    let mut listing = String::new();
    GzDecoder::new(manifest.as_slice())
        .read_to_string(&mut listing)
        .context("failed to decompress the taxon image manifest")?;

    let mut count = 0;
    let mut already_seen: HashSet<(i64, String)> = HashSet::new();

    for line in listing.lines() {
        let image_path = match manifest_path(line) {
            Some(path) => path,
            None => continue,
        };
        let filename = key_basename(image_path);

        if !filename.contains('.') {
            reporter.error(&format!("File lacks an extension: {}", filename));
            continue;
        }
        if filename.matches('.').count() > 1 {
            reporter.error(&format!("Filename has multiple periods: {}", filename));
            continue;
        }
        if filename.contains('_') {
            reporter.error(&format!("Filename has underscores: {}", filename));
            continue;
        }

        let (name, ext) = filename.split_once('.').unwrap_or((filename, ""));
        if !IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
            reporter.error(&format!("File lacks an image extension: {}", filename));
            continue;
        }

        let pieces: Vec<&str> = name.split('-').collect();
        if pieces.len() < 4 {
            reporter.error(&format!("Filename has too few fields: {}", filename));
            continue;
        }
        let genus = pieces[0];
        let species = pieces[1];

        // Skip subspecies and variety tokens, if provided, and scan
        // ahead to the type field, which always has length 2.
        let mut type_field = 2;
        while type_field < pieces.len() && pieces[type_field].len() != 2 {
            type_field += 1;
        }
        if type_field + 1 >= pieces.len() {
            reporter.error(&format!("Filename lacks a type field: {}", filename));
            continue;
        }
        let image_type_code = pieces[type_field];
        let photographer = pieces[type_field + 1];

        // Find the taxon for this species; hyphenated epithets swallow
        // the next token on retry.
        let mut scientific_name = capitalize(&format!("{} {}", genus, species));
        let mut taxon_id = taxon_ids.get(&Value::from(scientific_name.as_str()));
        if taxon_id.is_none() {
            scientific_name = format!("{}-{}", scientific_name, pieces[2]);
            taxon_id = taxon_ids.get(&Value::from(scientific_name.as_str()));
            if taxon_id.is_none() {
                reporter.error(&format!("Image names unknown taxon: {}", filename));
                continue;
            }
        }
        let taxon_id = taxon_id
            .and_then(Value::as_i64)
            .context("taxon map holds a non-integer id")?;

        // The type code is only meaningful within a pile, and a taxon
        // can sit in several; the first pile with a matching entry wins.
        let image_type_name = taxon_pile_map
            .get(&Value::Int(taxon_id))
            .into_iter()
            .flatten()
            .find_map(|pile_id| {
                let pile_name = pile_names.get(pile_id)?.as_str()?;
                taxon_image_types.get(&(pile_name.to_lowercase(), image_type_code.to_string()))
            });
        let image_type_name = match image_type_name {
            Some(name) => name.clone(),
            None => {
                reporter.error(&format!(
                    "Unknown image type {:?}: {}",
                    image_type_code, filename
                ));
                continue;
            }
        };

        image_type_table.get(&[image_type_name.as_str().into()]);

        // Arbitrarily promote the first image of each species-type pair
        // to rank 1; everything after it is rank 2.
        let rank_key = (taxon_id, image_type_name.clone());
        let rank = if already_seen.contains(&rank_key) {
            2
        } else {
            already_seen.insert(rank_key);
            1
        };

        content_image_table
            .get(&[taxon_id.into(), "taxon".into(), image_path.into()])
            .set(
                "alt",
                format!("{}: {}", scientific_name, image_type_name),
            )
            .set("creator", photographer)
            .set("description", "")
            .set("image_type_id", image_type_name.as_str())
            .set("rank", rank);

        count += 1;
    }

    // Final pass: append each image's rank to its alt description.
    for staged in content_image_table.rows_mut() {
        let rank = staged.value("rank").and_then(Value::as_i64).unwrap_or(1);
        let alt = staged
            .value("alt")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        staged.overwrite("alt", format!("{} {}", alt, rank));
    }

    image_type_table.save(false)?;
    let image_type_map = db.map("image_type", &["name"], "id")?;
    content_image_table.replace("image_type_id", &image_type_map)?;
    content_image_table.save(false)?;

    reporter.info(&format!("Imported {} taxon images", count));
    Ok(())
}

/// Load home page images from the storage listing, ordered
/// reverse-alphabetically (they happen to look good that way)
pub fn import_home_page_images(
    db: &Database,
    store: &dyn ObjectStore,
    reporter: &dyn Reporter,
) -> Result<()> {
    reporter.info("Loading home page images");

    let mut names: Vec<String> = store
        .list(HOME_PAGE_IMAGE_DIR)?
        .iter()
        .map(|key| key_basename(key).to_string())
        .collect();
    names.sort();
    names.reverse();

    let mut home_page_image = db.table("home_page_image", &["image"]);
    for (index, name) in names.iter().enumerate() {
        reporter.info(&format!("  Adding image: {}", name));
        home_page_image
            .get(&[format!("{}/{}", HOME_PAGE_IMAGE_DIR, name).into()])
            .set("display_order", (index + 1) as i64);
    }
    let outcome = home_page_image.save(true)?;

    reporter.info(&format!(
        "Loaded {} home page images",
        outcome.inserted + outcome.updated
    ));
    Ok(())
}

/// Object path of one manifest line: everything after the bucket root
fn manifest_path(line: &str) -> Option<&str> {
    let start = line.find("s3://")? + "s3://".len();
    let rest = &line[start..];
    let slash = rest.find('/')?;
    let path = rest[slash + 1..].trim();
    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_path() {
        let line = "2024-01-05 10:11  184320 s3://newfs/taxon-images/Sapindaceae/acer-rubrum-ba-ahaines.jpg";
        assert_eq!(
            manifest_path(line),
            Some("taxon-images/Sapindaceae/acer-rubrum-ba-ahaines.jpg")
        );
        assert_eq!(manifest_path("no bucket here"), None);
        assert_eq!(manifest_path("s3://newfs/"), None);
    }
}

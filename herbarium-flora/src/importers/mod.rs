//! Domain importers, one routine per curated source file
//!
//! Every importer follows the same policy: check the expected columns and
//! delimiters up front and report drift without aborting, create logged
//! placeholder rows for missing family/genus references, skip and report
//! rows with unresolvable references, stage everything through the upsert
//! layer, and save tables in dependency order.

use std::path::Path;

use herbarium_core::Reporter;

use crate::rows::open_csv;

mod archives;
mod characters;
mod distributions;
mod glossary;
mod images;
mod lookalikes;
mod matrices;
mod pages;
mod partners;
mod piles;
mod places;
mod reference;
mod taxa;
mod videos;

pub use archives::{zipimport, ziplist};
pub use characters::{
    import_character_images, import_character_value_images, import_character_values,
    import_characters,
};
pub use distributions::import_distributions;
pub use glossary::{import_glossary, import_glossary_images};
pub use images::{import_home_page_images, import_taxon_images};
pub use lookalikes::import_lookalikes;
pub use matrices::import_taxon_character_values;
pub use pages::{
    import_help_pages, import_plant_preview_characters, import_search_suggestions,
    import_simple_key_pages,
};
pub use partners::import_partner_species;
pub use piles::{import_pile_groups, import_piles};
pub use places::import_places;
pub use reference::{
    import_copyright_holders, import_habitats, import_partner_sites, import_wetland_indicators,
};
pub use taxa::{import_families, import_genera, import_plant_names, import_taxa};
pub use videos::import_videos;

// The delimiter the Access exports are supposed to use between values of
// a multi-valued column. It has been known to change quietly.
const EXPECTED_DELIMITER: &str = "| ";

/// Report any expected column missing from a file's header row.
/// The import continues either way; absent columns read as empty.
fn check_required_columns(
    file_label: &str,
    headers: &[String],
    required: &[&str],
    reporter: &dyn Reporter,
) {
    for column in required {
        if !headers.iter().any(|h| h == column) {
            reporter.error(&format!(
                "Required column missing from {}: {}",
                file_label, column
            ));
        }
    }
}

/// Report multi-valued columns in which the expected delimiter never
/// appears past the first byte of any row. A delimiter at the very start
/// of a value does not count.
fn check_delimiters(
    path: &Path,
    file_label: &str,
    columns: &[&str],
    reporter: &dyn Reporter,
) -> anyhow::Result<()> {
    for column in columns {
        let mut delimiter_found = false;
        for row in open_csv(path)? {
            let row = row?;
            if let Some(index) = row.field(column).find(EXPECTED_DELIMITER) {
                if index > 0 {
                    delimiter_found = true;
                    break;
                }
            }
        }
        if !delimiter_found {
            reporter.error(&format!(
                "Expected delimiter \"{}\" not found in {} column: {}",
                EXPECTED_DELIMITER, file_label, column
            ));
        }
    }
    Ok(())
}

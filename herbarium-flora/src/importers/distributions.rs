//! County-level distribution import with subspecies roll-up

use std::path::Path;

use anyhow::Result;

use herbarium_core::Reporter;
use herbarium_db::{Database, Table};

use crate::normalize::extract_species_name;
use crate::rows::{csv_headers, open_csv};
use crate::status::status_rank;

const DEFAULT_STATUS_COLUMN: &str = "status";
const ADJUSTED_STATUS_COLUMN: &str = "edited data";

/// Load county distribution data from a CSV file.
///
/// When the export carries hand-adjusted data its "edited data" column is
/// preferred and subspecies roll-up is skipped; with the plain status
/// column, infraspecific rows also update their parent species row
/// whenever their status outranks the parent's.
pub fn import_distributions(db: &Database, path: &Path, reporter: &dyn Reporter) -> Result<()> {
    reporter.info(&format!(
        "Importing distribution data from: {}",
        path.display()
    ));

    let headers = csv_headers(path)?;
    let status_column = if headers.iter().any(|h| h == ADJUSTED_STATUS_COLUMN) {
        ADJUSTED_STATUS_COLUMN
    } else {
        DEFAULT_STATUS_COLUMN
    };

    let mut distribution = db.table("distribution", &["scientific_name", "state", "county"]);

    for row in open_csv(path)? {
        let row = row?;
        let scientific_name = row.field("scientific_name");
        let state = row.field("state");
        let county = row.field("county");
        let status = row.field(status_column);

        distribution
            .get(&[scientific_name.into(), state.into(), county.into()])
            .set("status", status);

        if status_column == DEFAULT_STATUS_COLUMN {
            apply_subspecies_status(
                &mut distribution,
                scientific_name,
                state,
                county,
                status,
            );
        }
    }

    distribution.save(false)?;
    Ok(())
}

/// Roll an infraspecific row's status up into its parent species row when
/// the subspecies status has higher precedence
fn apply_subspecies_status(
    distribution: &mut Table<'_>,
    full_name: &str,
    state: &str,
    county: &str,
    status: &str,
) {
    let species_name = extract_species_name(full_name);
    if species_name == full_name {
        return;
    }

    let parent = distribution.get(&[species_name.into(), state.into(), county.into()]);
    let current_status = parent
        .value("status")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if status_rank(status) > status_rank(current_status) {
        // Deliberate second write; bypass collision accounting.
        parent.overwrite("status", status);
    }
}

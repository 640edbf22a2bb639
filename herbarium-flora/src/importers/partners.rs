//! Partner species list reconciliation from a spreadsheet

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use rusqlite::OptionalExtension;

use herbarium_core::Reporter;
use herbarium_db::Database;

/// Reconcile one partner site's species list against a spreadsheet.
///
/// Column B of the first sheet holds the partner's scientific names, one
/// per row under a header; trailing authority text is dropped by keeping
/// only the first two words. Links are adjusted in place: names we carry
/// but the partner no longer lists are unlinked, new ones are linked with
/// the simple-key flag on.
pub fn import_partner_species(
    db: &Database,
    partner_short_name: &str,
    excel_path: &Path,
    reporter: &dyn Reporter,
) -> Result<()> {
    reporter.info(&format!(
        "Loading partner species for {} from: {}",
        partner_short_name,
        excel_path.display()
    ));

    let conn = db.connection();
    let partner_id: Option<i64> = conn
        .query_row(
            "SELECT id FROM partner_site WHERE short_name = ?",
            [partner_short_name],
            |r| r.get(0),
        )
        .optional()?;
    let partner_id = match partner_id {
        Some(id) => id,
        None => bail!("no partner site named {:?}", partner_short_name),
    };

    let mut workbook = open_workbook_auto(excel_path)
        .with_context(|| format!("failed to open spreadsheet {}", excel_path.display()))?;
    let sheet = workbook
        .worksheet_range_at(0)
        .context("spreadsheet has no sheets")??;

    let mut theirs: BTreeSet<String> = BTreeSet::new();
    for row in sheet.rows().skip(1) {
        let cell = match row.get(1) {
            Some(Data::String(s)) => s.as_str(),
            _ => continue,
        };
        let name: Vec<&str> = cell.split_whitespace().take(2).collect();
        if !name.is_empty() {
            theirs.insert(name.join(" "));
        }
    }

    let mut ours: Vec<(i64, String)> = Vec::new();
    {
        let mut stmt =
            conn.prepare("SELECT id, scientific_name FROM taxon ORDER BY scientific_name")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            ours.push((row.get(0)?, row.get(1)?));
        }
    }

    let our_names: BTreeSet<&str> = ours.iter().map(|(_, name)| name.as_str()).collect();
    let knowns = theirs.iter().filter(|n| our_names.contains(n.as_str())).count();

    reporter.info(&format!("We list {} species", our_names.len()));
    reporter.info(&format!("They list {} species", theirs.len()));
    reporter.info(&format!("We know about {} of their species", knowns));
    if knowns < theirs.len() {
        reporter.info(&format!(
            "That leaves {} species we have not heard of:",
            theirs.len() - knowns
        ));
        for name in theirs.iter().filter(|n| !our_names.contains(n.as_str())) {
            reporter.warning(&format!("  {:?}", name));
        }
    }

    let mut added = 0;
    let mut removed = 0;
    for (taxon_id, scientific_name) in &ours {
        let linked: Option<i64> = conn
            .query_row(
                "SELECT id FROM partner_species WHERE taxon_id = ? AND partner_id = ?",
                [taxon_id, &partner_id],
                |r| r.get(0),
            )
            .optional()?;
        let listed = theirs.contains(scientific_name);

        match (linked, listed) {
            (Some(link_id), false) => {
                reporter.info(&format!("Removing {}", scientific_name));
                conn.execute("DELETE FROM partner_species WHERE id = ?", [link_id])?;
                removed += 1;
            }
            (None, true) => {
                reporter.info(&format!("Adding {}", scientific_name));
                conn.execute(
                    "INSERT INTO partner_species (taxon_id, partner_id, simple_key)
                     VALUES (?, ?, 1)",
                    [taxon_id, &partner_id],
                )?;
                added += 1;
            }
            _ => {}
        }
    }

    reporter.info(&format!(
        "Partner species for {}: {} added, {} removed",
        partner_short_name, added, removed
    ));
    Ok(())
}

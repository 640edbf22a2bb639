//! Small single-table reference imports

use std::path::Path;

use anyhow::Result;

use herbarium_core::Reporter;
use herbarium_db::Database;

use crate::rows::open_csv;

/// Create the known partner site rows
pub fn import_partner_sites(db: &Database, reporter: &dyn Reporter) -> Result<()> {
    reporter.info("Setting up partner sites");

    let mut partner_site = db.table("partner_site", &["short_name"]);
    for short_name in ["gobotany", "montshire"] {
        partner_site.get(&[short_name.into()]);
    }
    partner_site.save(false)?;
    Ok(())
}

/// Load copyright holders from a CSV file
pub fn import_copyright_holders(db: &Database, path: &Path, reporter: &dyn Reporter) -> Result<()> {
    reporter.info("Setting up copyright holders");

    let mut copyright_holder = db.table("copyright_holder", &["coded_name"]);
    for row in open_csv(path)? {
        let row = row?;
        copyright_holder
            .get(&[row.field("coded_name").into()])
            .set("expanded_name", row.field("expanded_name"))
            .set("copyright", row.field("copyright"))
            .set("source", row.field("image_source"));
    }
    copyright_holder.save(false)?;
    Ok(())
}

/// Load wetland indicators from a CSV file
pub fn import_wetland_indicators(db: &Database, path: &Path, reporter: &dyn Reporter) -> Result<()> {
    reporter.info("Setting up wetland indicators");

    let mut wetland_indicator = db.table("wetland_indicator", &["code"]);
    for row in open_csv(path)? {
        let row = row?;
        let sequence = match row.field("sequence").parse::<i64>() {
            Ok(n) => n,
            Err(_) => {
                reporter.error(&format!(
                    "Bad sequence value for wetland indicator {:?}: {:?}",
                    row.field("code"),
                    row.field("sequence")
                ));
                continue;
            }
        };
        wetland_indicator
            .get(&[row.field("code").into()])
            .set("name", row.field("name"))
            .set("friendly_description", row.field("friendly_description"))
            .set("sequence", sequence);
    }
    wetland_indicator.save(false)?;
    Ok(())
}

/// Load the habitat list from a CSV file
pub fn import_habitats(db: &Database, path: &Path, reporter: &dyn Reporter) -> Result<()> {
    reporter.info("Setting up habitats");

    let mut habitat = db.table("habitat", &["name"]);
    for row in open_csv(path)? {
        let row = row?;
        habitat
            .get(&[row.field("desc").into()])
            .set("friendly_name", row.field("friendly_text"));
    }
    habitat.save(false)?;
    Ok(())
}

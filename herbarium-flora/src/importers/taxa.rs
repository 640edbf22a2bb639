//! Family, genus, taxon and plant-name imports

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};

use herbarium_core::Reporter;
use herbarium_db::{Database, Value};

use crate::normalize::{slugify, strip_taxonomic_authority};
use crate::rows::{csv_headers, open_csv};
use crate::status::{split_states, state_status, STATES};

use super::{check_delimiters, check_required_columns};

/// Load botanic families from a CSV file
pub fn import_families(db: &Database, path: &Path, reporter: &dyn Reporter) -> Result<()> {
    reporter.info(&format!("Loading families from file: {}", path.display()));

    let headers = csv_headers(path)?;
    check_required_columns(
        "family.csv",
        &headers,
        &["family", "family_common_name", "description_revised"],
        reporter,
    );

    let mut family = db.table("family", &["slug"]);
    for row in open_csv(path)? {
        let row = row?;
        family
            .get(&[slugify(row.field("family")).into()])
            .set("common_name", row.field("family_common_name"))
            .set("description", row.field("description_revised"))
            .set("name", row.field("family"));
    }
    family.save(false)?;
    Ok(())
}

/// Load genus data from a CSV file
pub fn import_genera(db: &Database, path: &Path, reporter: &dyn Reporter) -> Result<()> {
    reporter.info(&format!("Loading genera from file: {}", path.display()));

    let headers = csv_headers(path)?;
    check_required_columns(
        "genera.csv",
        &headers,
        &["family", "genus", "genus_common_name", "description_revised"],
        reporter,
    );

    let family_map = db.map("family", &["slug"], "id")?;

    let mut genus = db.table("genus", &["slug"]);
    for row in open_csv(path)? {
        let row = row?;
        let family_slug = slugify(row.field("family"));

        let family_id = match family_map.get(&Value::from(family_slug.as_str())) {
            Some(id) => id.clone(),
            None => {
                reporter.error(&format!(
                    "Bad family name: {:?} [Slug: {:?}]",
                    row.field("family"),
                    family_slug
                ));
                continue;
            }
        };

        let genus_name = row.field("genus");
        genus
            .get(&[slugify(genus_name).into()])
            .set("common_name", row.field("genus_common_name"))
            .set("description", row.field("description_revised"))
            .set("family_id", family_id)
            .set("name", genus_name);
    }
    genus.save(false)?;
    Ok(())
}

/// Load the species list from a CSV file.
///
/// Creates placeholder family and genus rows for references missing from
/// the earlier imports, computes the six per-state conservation status
/// strings, assigns every species to the default partner site, and
/// rebuilds the pile-species, common-name and synonym join tables to
/// mirror this file exactly.
pub fn import_taxa(db: &Database, path: &Path, reporter: &dyn Reporter) -> Result<()> {
    reporter.info(&format!("Loading taxa from file: {}", path.display()));

    const COMMON_NAME_FIELDS: [&str; 2] = ["common_name1", "common_name2"];
    const MULTIVALUE_COLUMNS: [&str; 4] = [
        "distribution",
        "invasive_in_which_states",
        "prohibited_from_sale_states",
        "habitat",
    ];

    let headers = csv_headers(path)?;
    check_required_columns("taxa.csv", &headers, &MULTIVALUE_COLUMNS, reporter);
    check_delimiters(path, "taxa.csv", &MULTIVALUE_COLUMNS, reporter)?;

    let gobotany_id = default_partner_id(db, reporter)?;

    let mut family_table = db.table("family", &["slug"]);
    let mut genus_table = db.table("genus", &["slug"]);
    let mut taxon_table = db.table("taxon", &["scientific_name"]);
    let mut partner_species_table = db.table("partner_species", &["taxon_id", "partner_id"]);
    let mut pile_species_table = db.table("pile_species", &["pile_id", "taxon_id"]);
    let mut common_name_table = db.table("common_name", &["common_name", "taxon_id"]);
    let mut synonym_table = db.table("synonym", &["scientific_name", "taxon_id"]);

    let pile_map = db.map("pile", &["slug"], "id")?;
    let wetland_indicators = db.map("wetland_indicator", &["code"], "friendly_description")?;
    let family_map = db.map("family", &["slug"], "id")?;
    let genus_map = db.map("genus", &["slug"], "id")?;

    let mut missing_families: HashSet<String> = HashSet::new();
    let mut missing_genera: HashSet<String> = HashSet::new();

    for row in open_csv(path)? {
        let row = row?;

        let scientific_name = row.field("scientific__name").to_string();
        if scientific_name.is_empty() {
            continue;
        }

        let family_slug = slugify(row.field("family"));
        let genus_name = scientific_name
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_string();
        let genus_slug = slugify(&genus_name);

        // Placeholder rows keep the import going while the upstream data
        // files are still being completed.
        if !family_map.contains_key(&Value::from(family_slug.as_str()))
            && missing_families.insert(family_slug.clone())
        {
            reporter.warning(&format!(
                "Missing family name: {:?} [Slug: {:?}]",
                row.field("family"),
                family_slug
            ));
            family_table
                .get(&[family_slug.as_str().into()])
                .set("common_name", "")
                .set("description", "")
                .set("name", row.field("family"));
        }

        if !genus_map.contains_key(&Value::from(genus_slug.as_str()))
            && missing_genera.insert(genus_slug.clone())
        {
            reporter.warning(&format!(
                "Missing genus name: {:?} [Slug: {:?}]",
                genus_name, genus_slug
            ));
            genus_table
                .get(&[genus_slug.as_str().into()])
                .set("common_name", "")
                .set("description", "")
                .set("family_id", family_slug.as_str())
                .set("name", genus_name.as_str());
        }

        // Only one wetland indicator per plant is imported; the
        // categories are mutually exclusive probability ranges, so if the
        // record has more than one the first is used.
        let mut wetland_code = String::new();
        let mut wetland_text = String::new();
        let wetland_status = row.field("wetland_status");
        if !wetland_status.is_empty() && !wetland_status.eq_ignore_ascii_case("unclassified") {
            wetland_code = wetland_status
                .split('|')
                .next()
                .unwrap_or("")
                .trim()
                .to_string();
            match wetland_indicators.get(&Value::from(wetland_code.as_str())) {
                Some(Value::Text(text)) => wetland_text = text.clone(),
                _ => reporter.error(&format!(
                    "Unknown wetland indicator code: {:?} ({})",
                    wetland_code, scientific_name
                )),
            }
        }

        // A plant can be marked as both native to North America and
        // introduced: some natives are also native elsewhere, or have
        // cultivated varieties that escaped. Those are marked both Yes
        // and No in the source data.
        let native_data_value = row.field("native_to_north_america").to_lowercase();
        let north_american_native = if native_data_value.is_empty() {
            None
        } else {
            Some(native_data_value.contains("yes"))
        };
        let north_american_introduced = if native_data_value.is_empty() {
            None
        } else {
            Some(native_data_value.contains("no"))
        };

        let taxon = taxon_table.get(&[scientific_name.as_str().into()]);
        taxon
            .set("family_id", family_slug.as_str())
            .set("genus_id", genus_slug.as_str())
            .set("taxonomic_authority", row.field("taxonomic_authority"))
            .set("habitat", row.field("habitat"))
            .set("habitat_general", "")
            .set("factoid", row.field("factoid"))
            .set("wetland_indicator_code", wetland_code.as_str())
            .set("wetland_indicator_text", wetland_text.as_str())
            .set("north_american_native", Value::from(north_american_native))
            .set(
                "north_american_introduced",
                Value::from(north_american_introduced),
            )
            .set("distribution", row.field("distribution"))
            .set("invasive_in_states", row.field("invasive_in_which_states"))
            .set(
                "sale_prohibited_in_states",
                row.field("prohibited_from_sale_states"),
            )
            .set("description", "")
            .set("variety_notes", row.field("variety_notes"));

        // Distribution and conservation status for all six states.
        let distribution = split_states(row.field("distribution"));
        let invasive_states = split_states(row.field("invasive_in_which_states"));
        let prohibited_states = split_states(row.field("prohibited_from_sale_states"));
        let distribution_refs: Vec<&str> = distribution.iter().map(String::as_str).collect();

        for state in STATES {
            let column = format!("conservation_status_{}", state.to_lowercase());
            let conservation_code = row.field(&column);
            let status = state_status(
                state,
                &distribution_refs,
                conservation_code,
                invasive_states.iter().any(|s| s == state),
                prohibited_states.iter().any(|s| s == state),
            );
            taxon.set(column.as_str(), status);
        }

        // Every imported species belongs to the default partner site.
        partner_species_table
            .get(&[scientific_name.as_str().into(), gobotany_id.clone()])
            .set("simple_key", row.field("simple_key") == "TRUE");

        // Assign this taxon to its pile or piles.
        let piles = row.field("pile");
        if !piles.is_empty() {
            for pile_name in piles.split([',', ';', '|']) {
                let pile_slug = slugify(pile_name.trim());
                match pile_map.get(&Value::from(pile_slug.as_str())) {
                    Some(pile_id) => {
                        pile_species_table
                            .get(&[pile_id.clone(), scientific_name.as_str().into()]);
                    }
                    None => reporter.error(&format!(
                        "Unknown pile {:?} for taxon {}",
                        pile_name.trim(),
                        scientific_name
                    )),
                }
            }
        }

        for field in COMMON_NAME_FIELDS {
            let common_name = row.field(field).trim();
            if !common_name.is_empty() {
                common_name_table.get(&[common_name.into(), scientific_name.as_str().into()]);
            }
        }

        // Synonyms ride along in the comment column, separated by
        // semicolons and carrying authority text that must be stripped.
        for name in row.field("comment").split(';') {
            let name = name.trim();
            let stripped = strip_taxonomic_authority(name);
            if stripped.is_empty() || stripped.starts_with(' ') {
                continue;
            }
            synonym_table
                .get(&[stripped.as_str().into(), scientific_name.as_str().into()])
                .set("full_name", name);
        }
    }

    // Write the tables out in dependency order, resolving each deferred
    // natural key once its target table has been saved.
    family_table.save(false)?;
    let family_map = db.map("family", &["slug"], "id")?;
    genus_table.replace("family_id", &family_map)?;
    genus_table.save(false)?;
    let genus_map = db.map("genus", &["slug"], "id")?;
    taxon_table.replace("family_id", &family_map)?;
    taxon_table.replace("genus_id", &genus_map)?;
    taxon_table.save(false)?;
    let taxon_map = db.map("taxon", &["scientific_name"], "id")?;
    partner_species_table.replace("taxon_id", &taxon_map)?;
    partner_species_table.save(false)?;
    pile_species_table.replace("taxon_id", &taxon_map)?;
    pile_species_table.save(true)?;
    common_name_table.replace("taxon_id", &taxon_map)?;
    common_name_table.save(true)?;
    synonym_table.replace("taxon_id", &taxon_map)?;
    synonym_table.save(true)?;

    Ok(())
}

/// Load plant scientific/common name pairs from the taxa CSV file
pub fn import_plant_names(db: &Database, path: &Path, reporter: &dyn Reporter) -> Result<()> {
    reporter.info(&format!("Setting up plant names from file: {}", path.display()));

    const COMMON_NAME_FIELDS: [&str; 2] = ["common_name1", "common_name2"];

    let mut plant_name = db.table("plant_name", &["scientific_name", "common_name"]);
    for row in open_csv(path)? {
        let row = row?;
        let scientific_name = row.field("scientific__name");

        let mut num_common_names = 0;
        for field in COMMON_NAME_FIELDS {
            let common_name = row.field(field);
            if !common_name.is_empty() {
                num_common_names += 1;
                plant_name.get(&[scientific_name.into(), common_name.into()]);
            }
        }
        // A plant with no common names still gets a bare name row.
        if num_common_names == 0 {
            plant_name.get(&[scientific_name.into(), "".into()]);
        }
    }
    plant_name.save(false)?;
    Ok(())
}

/// Id of the default partner site, creating its row if the partner-sites
/// import has not run yet
fn default_partner_id(db: &Database, reporter: &dyn Reporter) -> Result<Value> {
    let partner_map = db.map("partner_site", &["short_name"], "id")?;
    if let Some(id) = partner_map.get(&Value::from("gobotany")) {
        return Ok(id.clone());
    }

    reporter.warning("Default partner site missing; creating it");
    let mut partner_site = db.table("partner_site", &["short_name"]);
    partner_site.get(&["gobotany".into()]);
    partner_site.save(false)?;

    let partner_map = db.map("partner_site", &["short_name"], "id")?;
    partner_map
        .get(&Value::from("gobotany"))
        .cloned()
        .context("partner site row vanished after save")
}

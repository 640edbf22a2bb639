//! Static command registry
//!
//! One table entry per import subcommand: its CLI name, a help line and
//! a handler tag describing the argument shape. `main` builds the clap
//! subcommands from this table and dispatches through it, so adding an
//! importer means adding one row here.

use std::path::{Path, PathBuf};

use anyhow::Result;

use herbarium_core::{data_file, Reporter};
use herbarium_db::Database;
use herbarium_flora::importers as imp;
use herbarium_flora::store::ObjectStore;

pub type PlainFn = fn(&Database, &dyn Reporter) -> Result<()>;
pub type FileFn = fn(&Database, &Path, &dyn Reporter) -> Result<()>;
pub type FilesFn = fn(&Database, &[PathBuf], &dyn Reporter) -> Result<()>;
pub type StoreFn = fn(&Database, &dyn ObjectStore, &dyn Reporter) -> Result<()>;
pub type StoreFileFn = fn(&Database, &dyn ObjectStore, &Path, &dyn Reporter) -> Result<()>;

/// Argument shape and entry point of one subcommand
pub enum Handler {
    /// Database only
    Plain(PlainFn),
    /// Database plus one input file
    File(FileFn),
    /// Database plus one or more input files
    Files(FilesFn),
    /// Database plus the object store
    Store(StoreFn),
    /// Database, object store and one input file
    StoreFile(StoreFileFn),
}

pub struct CommandSpec {
    pub name: &'static str,
    pub about: &'static str,
    pub handler: Handler,
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "partner-sites",
        about: "Create the partner site records",
        handler: Handler::Plain(imp::import_partner_sites),
    },
    CommandSpec {
        name: "copyright-holders",
        about: "Load copyright holders from a CSV file",
        handler: Handler::File(imp::import_copyright_holders),
    },
    CommandSpec {
        name: "wetland-indicators",
        about: "Load wetland indicators from a CSV file",
        handler: Handler::File(imp::import_wetland_indicators),
    },
    CommandSpec {
        name: "pile-groups",
        about: "Load pile groups from a CSV file",
        handler: Handler::File(imp::import_pile_groups),
    },
    CommandSpec {
        name: "piles",
        about: "Load piles from a CSV file",
        handler: Handler::File(imp::import_piles),
    },
    CommandSpec {
        name: "habitats",
        about: "Load habitats from a CSV file",
        handler: Handler::File(imp::import_habitats),
    },
    CommandSpec {
        name: "families",
        about: "Load families from a CSV file",
        handler: Handler::File(imp::import_families),
    },
    CommandSpec {
        name: "genera",
        about: "Load genera from a CSV file",
        handler: Handler::File(imp::import_genera),
    },
    CommandSpec {
        name: "taxa",
        about: "Load taxa and their joins from the taxa CSV file",
        handler: Handler::File(imp::import_taxa),
    },
    CommandSpec {
        name: "plant-names",
        about: "Load plant name pairs from the taxa CSV file",
        handler: Handler::File(imp::import_plant_names),
    },
    CommandSpec {
        name: "characters",
        about: "Load characters from a CSV file",
        handler: Handler::File(imp::import_characters),
    },
    CommandSpec {
        name: "character-values",
        about: "Load character values from a CSV file",
        handler: Handler::File(imp::import_character_values),
    },
    CommandSpec {
        name: "character-images",
        about: "Attach character illustrations found in storage",
        handler: Handler::StoreFile(imp::import_character_images),
    },
    CommandSpec {
        name: "character-value-images",
        about: "Attach character-value illustrations found in storage",
        handler: Handler::StoreFile(imp::import_character_value_images),
    },
    CommandSpec {
        name: "glossary",
        about: "Load glossary terms from a CSV file",
        handler: Handler::File(imp::import_glossary),
    },
    CommandSpec {
        name: "glossary-images",
        about: "Attach glossary illustrations found in storage",
        handler: Handler::StoreFile(imp::import_glossary_images),
    },
    CommandSpec {
        name: "taxon-character-values",
        about: "Load taxon character values from matrix CSV files",
        handler: Handler::Files(imp::import_taxon_character_values),
    },
    CommandSpec {
        name: "places",
        about: "Load habitat and distribution characters from the taxa CSV file",
        handler: Handler::File(imp::import_places),
    },
    CommandSpec {
        name: "distributions",
        about: "Load county distribution data from a CSV file",
        handler: Handler::File(imp::import_distributions),
    },
    CommandSpec {
        name: "taxon-images",
        about: "Load taxon images from the storage manifest",
        handler: Handler::Store(taxon_images),
    },
    CommandSpec {
        name: "home-page-images",
        about: "Load home page images from the storage listing",
        handler: Handler::Store(imp::import_home_page_images),
    },
    CommandSpec {
        name: "lookalikes",
        about: "Load look-alike plants from a CSV file",
        handler: Handler::File(imp::import_lookalikes),
    },
    CommandSpec {
        name: "videos",
        about: "Load pile and pile-group videos from a CSV file",
        handler: Handler::File(imp::import_videos),
    },
    CommandSpec {
        name: "help",
        about: "Create the help page records",
        handler: Handler::Plain(imp::import_help_pages),
    },
    CommandSpec {
        name: "simple-key-pages",
        about: "Create the Simple Key page records",
        handler: Handler::Plain(imp::import_simple_key_pages),
    },
    CommandSpec {
        name: "plant-preview-characters",
        about: "Set up plant preview characters from the characters CSV file",
        handler: Handler::File(imp::import_plant_preview_characters),
    },
    CommandSpec {
        name: "search-suggestions",
        about: "Rebuild the search suggestion table",
        handler: Handler::Plain(imp::import_search_suggestions),
    },
    CommandSpec {
        name: "constants",
        about: "Run every import that needs no input beyond the characters CSV file",
        handler: Handler::File(constants),
    },
];

pub fn find(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

/// The taxon image manifest names its categories file implicitly
fn taxon_images(db: &Database, store: &dyn ObjectStore, reporter: &dyn Reporter) -> Result<()> {
    imp::import_taxon_images(db, store, &data_file("image_categories.csv"), reporter)
}

/// Derived records that need no curated input of their own
fn constants(db: &Database, characters_csv: &Path, reporter: &dyn Reporter) -> Result<()> {
    imp::import_plant_preview_characters(db, characters_csv, reporter)?;
    imp::import_help_pages(db, reporter)?;
    imp::import_simple_key_pages(db, reporter)?;
    imp::import_search_suggestions(db, reporter)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names_are_unique() {
        let mut names: Vec<&str> = COMMANDS.iter().map(|c| c.name).collect();
        names.sort();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }

    #[test]
    fn test_find_known_and_unknown() {
        assert!(find("taxa").is_some());
        assert!(find("no-such-import").is_none());
    }
}

use std::path::PathBuf;
use std::process;

use anyhow::{bail, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::*;
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

mod registry;

use herbarium_core::{data_dir, database_path, storage_url, HerbariumError, LogReporter};
use herbarium_db::{ensure_schema, Database};
use herbarium_flora::importers::{import_partner_species, zipimport, ziplist};
use herbarium_flora::store::open_store;

use crate::registry::{CommandSpec, Handler, COMMANDS};

fn main() {
    let matches = build_cli().get_matches();

    // Flags override the environment; the config helpers read the
    // environment once, so export before anything touches them.
    for (flag, variable) in [
        ("db", "HERBARIUM_DB"),
        ("data", "HERBARIUM_DATA"),
        ("storage", "HERBARIUM_STORAGE"),
    ] {
        if let Some(value) = matches.get_one::<String>(flag) {
            std::env::set_var(variable, value);
        }
    }

    init_logging(matches.get_count("verbose"));

    if let Err(e) = run(&matches) {
        eprintln!("{} {}", "Error:".red().bold(), e);

        let exit_code = match e.downcast_ref::<HerbariumError>() {
            Some(HerbariumError::Configuration(_)) => 2,
            Some(HerbariumError::Io(_)) => 3,
            Some(HerbariumError::Decode(_)) | Some(HerbariumError::Parse(_)) => 4,
            Some(HerbariumError::Database(_)) => 5,
            Some(HerbariumError::Storage(_)) => 6,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

// Log level comes from HERBARIUM_LOG unless -v asks for more
fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => std::env::var("HERBARIUM_LOG").unwrap_or_else(|_| "warn".to_string()),
        1 => "info".to_string(),
        _ => "debug".to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn build_cli() -> Command {
    let mut cli = Command::new("herbarium")
        .about("Import curated flora data into the site database")
        .version(herbarium_core::VERSION)
        .subcommand_required(true)
        .arg_required_else_help(true)
        // The registry defines its own `help` import subcommand, which
        // collides with clap's generated one.
        .disable_help_subcommand(true)
        .arg(
            Arg::new("db")
                .long("db")
                .value_name("PATH")
                .global(true)
                .help("SQLite database path [env: HERBARIUM_DB]"),
        )
        .arg(
            Arg::new("data")
                .long("data")
                .value_name("DIR")
                .global(true)
                .help("Local directory holding CSV side-files [env: HERBARIUM_DATA]"),
        )
        .arg(
            Arg::new("storage")
                .long("storage")
                .value_name("URL")
                .global(true)
                .help("Object store location, s3://bucket or file:///dir [env: HERBARIUM_STORAGE]"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .global(true)
                .help("Increase log verbosity (-v info, -vv debug)"),
        );

    for spec in COMMANDS {
        cli = cli.subcommand(subcommand_for(spec));
    }

    cli.subcommand(
        Command::new("partner")
            .about("Reconcile a partner site's species list from a spreadsheet")
            .arg(
                Arg::new("partner")
                    .required(true)
                    .help("short name of the partner site"),
            )
            .arg(
                Arg::new("filename")
                    .required(true)
                    .value_parser(clap::value_parser!(PathBuf))
                    .help("spreadsheet listing the partner's species"),
            ),
    )
    .subcommand(Command::new("ziplist").about("List the data archives available in storage"))
    .subcommand(
        Command::new("zipimport")
            .about("Fetch a data archive into the data directory")
            .arg(
                Arg::new("filename")
                    .value_parser(clap::value_parser!(String))
                    .help("archive name; omit to use the latest"),
            ),
    )
}

fn subcommand_for(spec: &CommandSpec) -> Command {
    let sub = Command::new(spec.name).about(spec.about);
    match spec.handler {
        Handler::File(_) | Handler::StoreFile(_) => sub.arg(
            Arg::new("filename")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("name of the file to load"),
        ),
        Handler::Files(_) => sub.arg(
            Arg::new("filenames")
                .required(true)
                .num_args(1..)
                .value_parser(clap::value_parser!(PathBuf))
                .help("one or more files to load"),
        ),
        Handler::Plain(_) | Handler::Store(_) => sub,
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let (name, sub) = match matches.subcommand() {
        Some(parts) => parts,
        None => bail!("no subcommand given"),
    };
    let reporter = LogReporter;

    // The archive commands only talk to storage; no database involved.
    match name {
        "ziplist" => {
            let store = open_store(&storage_url())?;
            for archive in ziplist(store.as_ref())? {
                println!("{}", archive);
            }
            return Ok(());
        }
        "zipimport" => {
            let store = open_store(&storage_url())?;
            let archive = sub.get_one::<String>("filename").map(String::as_str);
            let path = zipimport(store.as_ref(), &data_dir(), archive, &reporter)?;
            println!("{} {}", "✓".green().bold(), path.display());
            return Ok(());
        }
        _ => {}
    }

    eprintln!("{} {}", "►".cyan().bold(), name);

    let mut conn = Connection::open(database_path())?;
    ensure_schema(&conn)?;
    let tx = conn.transaction()?;
    {
        let db = Database::new(&tx);
        dispatch(name, sub, &db, &reporter)?;
    }
    tx.commit()?;

    eprintln!("{} {}", "✓".green().bold(), name);
    Ok(())
}

fn dispatch(name: &str, sub: &ArgMatches, db: &Database, reporter: &LogReporter) -> Result<()> {
    if name == "partner" {
        let partner = sub
            .get_one::<String>("partner")
            .map(String::as_str)
            .unwrap_or_default();
        let filename: &PathBuf = match sub.get_one("filename") {
            Some(path) => path,
            None => bail!("partner requires a spreadsheet file"),
        };
        return import_partner_species(db, partner, filename, reporter);
    }

    let spec = match registry::find(name) {
        Some(spec) => spec,
        None => bail!("unknown subcommand: {}", name),
    };

    match spec.handler {
        Handler::Plain(handler) => handler(db, reporter),
        Handler::File(handler) => {
            let filename: &PathBuf = match sub.get_one("filename") {
                Some(path) => path,
                None => bail!("{} requires a file to load", name),
            };
            handler(db, filename, reporter)
        }
        Handler::Files(handler) => {
            let filenames: Vec<PathBuf> = sub
                .get_many::<PathBuf>("filenames")
                .into_iter()
                .flatten()
                .cloned()
                .collect();
            handler(db, &filenames, reporter)
        }
        Handler::Store(handler) => {
            let store = open_store(&storage_url())?;
            handler(db, store.as_ref(), reporter)
        }
        Handler::StoreFile(handler) => {
            let filename: &PathBuf = match sub.get_one("filename") {
                Some(path) => path,
                None => bail!("{} requires a file to load", name),
            };
            let store = open_store(&storage_url())?;
            handler(db, store.as_ref(), filename, reporter)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_registry_subcommands() {
        let cli = build_cli();
        let matches = cli
            .try_get_matches_from(["herbarium", "taxa", "taxa.csv"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "taxa");
        assert_eq!(
            sub.get_one::<PathBuf>("filename").unwrap(),
            &PathBuf::from("taxa.csv")
        );
    }

    #[test]
    fn test_cli_accepts_multiple_matrix_files() {
        let matches = build_cli()
            .try_get_matches_from([
                "herbarium",
                "taxon-character-values",
                "pile_ly.csv",
                "pile_co.csv",
            ])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let files: Vec<&PathBuf> = sub.get_many("filenames").unwrap().collect();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_cli_rejects_missing_subcommand_argument() {
        assert!(build_cli()
            .try_get_matches_from(["herbarium", "glossary"])
            .is_err());
    }

    #[test]
    fn test_zipimport_archive_name_is_optional() {
        let matches = build_cli()
            .try_get_matches_from(["herbarium", "zipimport"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "zipimport");
        assert!(sub.get_one::<String>("filename").is_none());
    }
}

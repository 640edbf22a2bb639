//! Character and matrix imports against an in-memory database

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use rusqlite::Connection;

use herbarium_core::{RecordingReporter, Severity};
use herbarium_db::{ensure_schema, Database};
use herbarium_flora::importers::{
    import_character_values, import_characters, import_taxon_character_values,
};

fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    ensure_schema(&conn).unwrap();
    conn
}

fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

const CHARACTERS_CSV: &str = "\
character,character_group,units,ease_of_observability,filter_label,friendly_text,hint
horizontal_shoot_position_ly,growth form,,2,Shoot position,Where does the shoot sit?,
trophophyll_length_min_ly,leaves,cm,4,,,
trophophyll_length_max_ly,leaves,cm,4,,,
sporophyll_length_min_ly,leaves,cm,5,,,
family,taxonomy,,1,,,
";

const CHARACTER_VALUES_CSV: &str = "\
character,character_value,friendly_text
horizontal_shoot_position_ly,on surface,Shoots run along the ground
horizontal_shoot_position_ly,subterranean,Shoots run underground
";

const MATRIX_CSV: &str = "\
Scientific__Name,horizontal_shoot_position_ly,trophophyll_length_min_ly,trophophyll_length_max_ly,sporophyll_length_min_ly
Huperzia lucidula,on surface| subterranean,2.5,4.0,1.0
Lycopodium clavatum,on surface,bad,3.0,
";

fn seed_pile_and_taxa(db: &Database) {
    let mut pile = db.table("pile", &["slug"]);
    pile.get(&["lycophytes".into()]).set("name", "Lycophytes");
    pile.save(false).unwrap();

    let mut taxon = db.table("taxon", &["scientific_name"]);
    taxon.get(&["Huperzia lucidula".into()]);
    taxon.get(&["Lycopodium clavatum".into()]);
    taxon.save(false).unwrap();
}

fn run_character_imports(conn: &Connection, dir: &Path, reporter: &RecordingReporter) {
    let db = Database::new(conn);
    seed_pile_and_taxa(&db);

    let characters = write_csv(dir, "characters.csv", CHARACTERS_CSV);
    let values = write_csv(dir, "character_values.csv", CHARACTER_VALUES_CSV);
    import_characters(&db, &characters, reporter).unwrap();
    import_character_values(&db, &values, reporter).unwrap();
}

#[test]
fn test_characters_import_types_and_piles() {
    let conn = test_conn();
    let dir = tempfile::tempdir().unwrap();
    let reporter = RecordingReporter::new();

    run_character_imports(&conn, dir.path(), &reporter);

    // Min and max columns collapse into one LENGTH character.
    let (value_type, unit, pile): (String, String, String) = conn
        .query_row(
            "SELECT c.value_type, c.unit, p.name FROM character c
               JOIN pile p ON c.pile_id = p.id
              WHERE c.short_name = 'trophophyll_length_ly'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap();
    assert_eq!(value_type, "LENGTH");
    assert_eq!(unit, "cm");
    assert_eq!(pile, "Lycophytes");

    let discrete_type: String = conn
        .query_row(
            "SELECT value_type FROM character WHERE short_name = 'horizontal_shoot_position_ly'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(discrete_type, "TEXT");

    // The no-underscore family row is skipped without a character record.
    let family_rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM character WHERE short_name = 'family'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(family_rows, 0);
}

#[test]
fn test_matrix_import_links_discrete_and_range_values() {
    let conn = test_conn();
    let dir = tempfile::tempdir().unwrap();
    let reporter = RecordingReporter::new();

    run_character_imports(&conn, dir.path(), &reporter);
    let db = Database::new(&conn);
    let matrix = write_csv(dir.path(), "pile_lycophytes.csv", MATRIX_CSV);
    import_taxon_character_values(&db, &[matrix], &reporter).unwrap();

    // Huperzia: two discrete links plus one complete range link.
    let huperzia_links: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM taxon_character_value tcv
               JOIN taxon t ON tcv.taxon_id = t.id
              WHERE t.scientific_name = 'Huperzia lucidula'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(huperzia_links, 3);

    let (value_min, value_max): (f64, f64) = conn
        .query_row(
            "SELECT cv.value_min, cv.value_max FROM character_value cv
               JOIN character c ON cv.character_id = c.id
              WHERE c.short_name = 'trophophyll_length_ly'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(value_min, 2.5);
    assert_eq!(value_max, 4.0);

    // Lycopodium's min failed to parse, so no range value exists for it,
    // but its discrete value still linked.
    let lycopodium_links: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM taxon_character_value tcv
               JOIN taxon t ON tcv.taxon_id = t.id
              WHERE t.scientific_name = 'Lycopodium clavatum'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(lycopodium_links, 1);

    assert!(reporter.contains(Severity::Debug, "Bad floating-point value: bad"));
    // The sporophyll column never saw a max bound.
    assert!(reporter.contains(Severity::Debug, "sporophyll_length_ly"));
}

#[test]
fn test_range_bounds_in_separate_rows_form_one_value() {
    let conn = test_conn();
    let dir = tempfile::tempdir().unwrap();
    let reporter = RecordingReporter::new();

    run_character_imports(&conn, dir.path(), &reporter);
    let db = Database::new(&conn);

    // Min and max arrive on different rows of the same file.
    let csv = "\
Scientific__Name,trophophyll_length_min_ly,trophophyll_length_max_ly
Huperzia lucidula,2.5,
Huperzia lucidula,,4.0
";
    let matrix = write_csv(dir.path(), "pile_lycophytes.csv", csv);
    import_taxon_character_values(&db, &[matrix], &reporter).unwrap();

    let rows: Vec<(f64, f64)> = {
        let mut stmt = conn
            .prepare(
                "SELECT cv.value_min, cv.value_max FROM character_value cv
                   JOIN character c ON cv.character_id = c.id
                  WHERE c.short_name = 'trophophyll_length_ly'",
            )
            .unwrap();
        stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap()
            .map(Result::unwrap)
            .collect()
    };
    assert_eq!(rows, vec![(2.5, 4.0)]);

    let links: i64 = conn
        .query_row("SELECT COUNT(*) FROM taxon_character_value", [], |r| r.get(0))
        .unwrap();
    assert_eq!(links, 1);
}

#[test]
fn test_matrix_reimport_does_not_duplicate_or_prune() {
    let conn = test_conn();
    let dir = tempfile::tempdir().unwrap();
    let reporter = RecordingReporter::new();

    run_character_imports(&conn, dir.path(), &reporter);
    let db = Database::new(&conn);
    let matrix = write_csv(dir.path(), "pile_lycophytes.csv", MATRIX_CSV);

    import_taxon_character_values(&db, std::slice::from_ref(&matrix), &reporter).unwrap();
    let first: i64 = conn
        .query_row("SELECT COUNT(*) FROM taxon_character_value", [], |r| r.get(0))
        .unwrap();

    import_taxon_character_values(&db, std::slice::from_ref(&matrix), &reporter).unwrap();
    let second: i64 = conn
        .query_row("SELECT COUNT(*) FROM taxon_character_value", [], |r| r.get(0))
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_matrix_unknown_taxon_is_reported_and_skipped() {
    let conn = test_conn();
    let dir = tempfile::tempdir().unwrap();
    let reporter = RecordingReporter::new();

    run_character_imports(&conn, dir.path(), &reporter);
    let db = Database::new(&conn);

    let csv = "\
Scientific__Name,horizontal_shoot_position_ly
Nonexistens plantus,on surface
";
    let matrix = write_csv(dir.path(), "pile_mystery.csv", csv);
    import_taxon_character_values(&db, &[matrix], &reporter).unwrap();

    assert!(reporter.contains(Severity::Error, "Unknown taxon"));
    let links: i64 = conn
        .query_row("SELECT COUNT(*) FROM taxon_character_value", [], |r| r.get(0))
        .unwrap();
    assert_eq!(links, 0);
}

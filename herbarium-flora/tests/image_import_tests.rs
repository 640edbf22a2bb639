//! Taxon and home-page image imports against a local directory store

use std::fs;
use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use pretty_assertions::assert_eq;
use rusqlite::Connection;

use herbarium_core::{RecordingReporter, Severity};
use herbarium_db::{ensure_schema, Database, Value};
use herbarium_flora::importers::{import_home_page_images, import_taxon_images};
use herbarium_flora::store::DirStore;

fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    ensure_schema(&conn).unwrap();
    conn
}

fn write_manifest(root: &Path, lines: &[&str]) {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    for line in lines {
        writeln!(encoder, "{}", line).unwrap();
    }
    let bytes = encoder.finish().unwrap();
    fs::write(root.join("ls-taxon-images.gz"), bytes).unwrap();
}

const IMAGE_CATEGORIES_CSV: &str = "\
pile,code,category
Woody Angiosperms,ba,\"bark, ba\"
Woody Angiosperms,ha,\"plant form, ha\"
";

fn seed_taxon_in_pile(db: &Database) {
    let mut pile = db.table("pile", &["slug"]);
    pile.get(&["woody-angiosperms".into()])
        .set("name", "Woody Angiosperms");
    pile.save(false).unwrap();

    let mut taxon = db.table("taxon", &["scientific_name"]);
    taxon.get(&["Acer rubrum".into()]);
    taxon.save(false).unwrap();

    let pile_map = db.map("pile", &["slug"], "id").unwrap();
    let taxon_map = db.map("taxon", &["scientific_name"], "id").unwrap();
    let mut pile_species = db.table("pile_species", &["pile_id", "taxon_id"]);
    pile_species.get(&[
        pile_map[&Value::from("woody-angiosperms")].clone(),
        taxon_map[&Value::from("Acer rubrum")].clone(),
    ]);
    pile_species.save(false).unwrap();
}

fn manifest_line(filename: &str) -> String {
    format!(
        "2011-06-01 09:30 184320 s3://newfs/taxon-images/Sapindaceae/{}",
        filename
    )
}

#[test]
fn test_taxon_images_rank_and_alt_text() {
    let conn = test_conn();
    let db = Database::new(&conn);
    seed_taxon_in_pile(&db);

    let root = tempfile::tempdir().unwrap();
    write_manifest(
        root.path(),
        &[
            &manifest_line("acer-rubrum-ba-ahaines.jpg"),
            &manifest_line("acer-rubrum-ba-dcameron.jpg"),
            &manifest_line("acer-rubrum-ha-ahaines.jpg"),
        ],
    );
    let categories = root.path().join("image_categories.csv");
    fs::write(&categories, IMAGE_CATEGORIES_CSV).unwrap();

    let store = DirStore::new(root.path().to_path_buf());
    let reporter = RecordingReporter::new();
    import_taxon_images(&db, &store, &categories, &reporter).unwrap();

    let rows: Vec<(String, String, i64, String)> = {
        let mut stmt = conn
            .prepare(
                "SELECT ci.image, ci.alt, ci.rank, it.name
                   FROM content_image ci JOIN image_type it ON ci.image_type_id = it.id
                  ORDER BY ci.image",
            )
            .unwrap();
        stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))
            .unwrap()
            .map(Result::unwrap)
            .collect()
    };

    assert_eq!(rows.len(), 3);
    // First bark image is rank 1, the second is rank 2, never 3.
    assert_eq!(rows[0].2, 1);
    assert_eq!(rows[1].2, 2);
    assert_eq!(rows[2].2, 1);
    assert_eq!(rows[0].1, "Acer rubrum: bark 1");
    assert_eq!(rows[1].1, "Acer rubrum: bark 2");
    assert_eq!(rows[2].3, "plant form");
    // Photographer parsed from the token after the type code.
    let creator: String = conn
        .query_row(
            "SELECT creator FROM content_image WHERE image LIKE '%dcameron%'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(creator, "dcameron");
}

#[test]
fn test_taxon_images_reject_malformed_filenames() {
    let conn = test_conn();
    let db = Database::new(&conn);
    seed_taxon_in_pile(&db);

    let root = tempfile::tempdir().unwrap();
    write_manifest(
        root.path(),
        &[
            &manifest_line("acer_rubrum-ba-ahaines.jpg"),
            &manifest_line("acer-rubrum-ba-ahaines.jpg.bak"),
            &manifest_line("acer-rubrum-ba-ahaines.txt"),
            &manifest_line("betula-lenta-ba-ahaines.jpg"),
        ],
    );
    let categories = root.path().join("image_categories.csv");
    fs::write(&categories, IMAGE_CATEGORIES_CSV).unwrap();

    let store = DirStore::new(root.path().to_path_buf());
    let reporter = RecordingReporter::new();
    import_taxon_images(&db, &store, &categories, &reporter).unwrap();

    assert!(reporter.contains(Severity::Error, "underscores"));
    assert!(reporter.contains(Severity::Error, "multiple periods"));
    assert!(reporter.contains(Severity::Error, "image extension"));
    assert!(reporter.contains(Severity::Error, "unknown taxon"));

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM content_image", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn test_taxon_images_reimport_keeps_unlisted_rows() {
    let conn = test_conn();
    let db = Database::new(&conn);
    seed_taxon_in_pile(&db);

    let root = tempfile::tempdir().unwrap();
    let categories = root.path().join("image_categories.csv");
    fs::write(&categories, IMAGE_CATEGORIES_CSV).unwrap();
    let store = DirStore::new(root.path().to_path_buf());
    let reporter = RecordingReporter::new();

    write_manifest(
        root.path(),
        &[
            &manifest_line("acer-rubrum-ba-ahaines.jpg"),
            &manifest_line("acer-rubrum-ha-ahaines.jpg"),
        ],
    );
    import_taxon_images(&db, &store, &categories, &reporter).unwrap();

    // The bark photo disappears from the next manifest, but its row is
    // left alone rather than deleted.
    write_manifest(root.path(), &[&manifest_line("acer-rubrum-ha-ahaines.jpg")]);
    import_taxon_images(&db, &store, &categories, &reporter).unwrap();

    let images: Vec<String> = {
        let mut stmt = conn
            .prepare("SELECT image FROM content_image ORDER BY image")
            .unwrap();
        stmt.query_map([], |r| r.get(0))
            .unwrap()
            .map(Result::unwrap)
            .collect()
    };
    assert_eq!(
        images,
        vec![
            "taxon-images/Sapindaceae/acer-rubrum-ba-ahaines.jpg".to_string(),
            "taxon-images/Sapindaceae/acer-rubrum-ha-ahaines.jpg".to_string(),
        ]
    );
}

#[test]
fn test_home_page_images_reverse_alphabetical_order() {
    let conn = test_conn();
    let db = Database::new(&conn);

    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("home-page-images");
    fs::create_dir(&dir).unwrap();
    for name in ["a-trillium.jpg", "b-laurel.jpg", "c-aster.jpg"] {
        fs::write(dir.join(name), b"jpeg").unwrap();
    }

    let store = DirStore::new(root.path().to_path_buf());
    let reporter = RecordingReporter::new();
    import_home_page_images(&db, &store, &reporter).unwrap();

    let rows: Vec<(String, i64)> = {
        let mut stmt = conn
            .prepare("SELECT image, display_order FROM home_page_image ORDER BY display_order")
            .unwrap();
        stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap()
            .map(Result::unwrap)
            .collect()
    };
    assert_eq!(
        rows,
        vec![
            ("home-page-images/c-aster.jpg".to_string(), 1),
            ("home-page-images/b-laurel.jpg".to_string(), 2),
            ("home-page-images/a-trillium.jpg".to_string(), 3),
        ]
    );
}

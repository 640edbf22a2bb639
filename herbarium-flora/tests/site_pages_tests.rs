//! Help pages, Simple Key pages and search suggestions

use pretty_assertions::assert_eq;
use rusqlite::Connection;

use herbarium_core::RecordingReporter;
use herbarium_db::{ensure_schema, Database};
use herbarium_flora::importers::{
    import_help_pages, import_search_suggestions, import_simple_key_pages,
};

fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    ensure_schema(&conn).unwrap();
    conn
}

fn seed_key_hierarchy(conn: &Connection) {
    let db = Database::new(conn);

    let mut group = db.table("pile_group", &["slug"]);
    group
        .get(&["ferns".into()])
        .set("name", "Ferns")
        .set("friendly_name", "Ferns and relatives")
        .set("friendly_title", "Ferns");
    group.save(false).unwrap();
    let group_map = db.map("pile_group", &["slug"], "id").unwrap();

    let mut pile = db.table("pile", &["slug"]);
    pile.get(&["lycophytes".into()])
        .set("name", "Lycophytes")
        .set("friendly_name", "Clubmosses and quillworts")
        .set("friendly_title", "Clubmosses")
        .set(
            "pile_group_id",
            group_map[&herbarium_db::Value::from("ferns")].clone(),
        );
    pile.save(false).unwrap();
}

#[test]
fn test_help_pages_and_glossary_letter_pages() {
    let conn = test_conn();
    let reporter = RecordingReporter::new();

    {
        let db = Database::new(&conn);
        let mut term = db.table("glossary_term", &["term"]);
        term.get(&["bract".into()]).set("lay_definition", "a leaf");
        term.get(&["blade".into()]).set("lay_definition", "flat part");
        term.get(&["x".into()]).set("lay_definition", "unknown factor");
        term.save(false).unwrap();

        import_help_pages(&db, &reporter).unwrap();
    }

    let help_pages: i64 = conn
        .query_row("SELECT COUNT(*) FROM help_page", [], |r| r.get(0))
        .unwrap();
    assert_eq!(help_pages, 4);

    let letters: Vec<String> = {
        let mut stmt = conn
            .prepare("SELECT letter FROM glossary_help_page ORDER BY letter")
            .unwrap();
        stmt.query_map([], |r| r.get(0))
            .unwrap()
            .map(Result::unwrap)
            .collect()
    };
    assert_eq!(letters, vec!["b", "x"]);

    let title: String = conn
        .query_row(
            "SELECT title FROM glossary_help_page WHERE letter = 'b'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(title, "Glossary: B");

    // Both b-terms join their page; the one-letter term joins nothing.
    let joins: i64 = conn
        .query_row("SELECT COUNT(*) FROM glossary_help_page_term", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(joins, 2);
}

#[test]
fn test_simple_key_pages_mirror_the_hierarchy() {
    let conn = test_conn();
    let reporter = RecordingReporter::new();
    seed_key_hierarchy(&conn);

    {
        let db = Database::new(&conn);
        import_simple_key_pages(&db, &reporter).unwrap();
    }

    let subgroups_title: String = conn
        .query_row("SELECT title FROM subgroups_list_page", [], |r| r.get(0))
        .unwrap();
    assert_eq!(subgroups_title, "Ferns: Simple Key");

    let (results_title, results_heading): (String, String) = conn
        .query_row(
            "SELECT title, main_heading FROM subgroup_results_page",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(results_title, "Clubmosses: Ferns: Simple Key");
    assert_eq!(results_heading, "Clubmosses");

    let group_joins: i64 = conn
        .query_row("SELECT COUNT(*) FROM groups_list_page_group", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(group_joins, 1);
}

#[test]
fn test_search_suggestions_rebuild_from_scratch() {
    let conn = test_conn();
    let reporter = RecordingReporter::new();
    seed_key_hierarchy(&conn);

    {
        let db = Database::new(&conn);
        let mut taxon = db.table("taxon", &["scientific_name"]);
        taxon.get(&["Acer rubrum".into()]);
        taxon.save(false).unwrap();

        // A stale suggestion from an earlier run should disappear.
        conn.execute(
            "INSERT INTO search_suggestion (term) VALUES ('obsolete term')",
            [],
        )
        .unwrap();

        import_search_suggestions(&db, &reporter).unwrap();
    }

    let terms: Vec<String> = {
        let mut stmt = conn
            .prepare("SELECT term FROM search_suggestion ORDER BY term")
            .unwrap();
        stmt.query_map([], |r| r.get(0))
            .unwrap()
            .map(Result::unwrap)
            .collect()
    };

    assert!(terms.contains(&"acer rubrum".to_string()));
    assert!(terms.contains(&"ferns".to_string()));
    assert!(terms.contains(&"lycophytes".to_string()));
    // Phrase derived from a friendly name, split at the connective.
    assert!(terms.contains(&"clubmosses".to_string()));
    assert!(terms.contains(&"quillworts".to_string()));
    assert!(!terms.contains(&"obsolete term".to_string()));
}

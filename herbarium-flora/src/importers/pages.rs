//! Site page records and search suggestions
//!
//! These tables exist so the site's search engine has something to index:
//! help pages, the Simple Key page hierarchy, per-pile preview characters
//! and a flat table of suggestion terms.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension};

use herbarium_core::Reporter;
use herbarium_db::{Database, Value};

use crate::normalize::character_short_name;
use crate::rows::open_csv;

/// Create the static help pages and the per-letter glossary pages
pub fn import_help_pages(db: &Database, reporter: &dyn Reporter) -> Result<()> {
    reporter.info("Setting up help pages and content");

    let conn = db.connection();
    let mut help_page = db.table("help_page", &["title", "url_path"]);
    help_page.get(&["About".into(), "/help/".into()]);
    help_page.get(&["Getting Started".into(), "/help/start/".into()]);
    help_page.get(&["Advanced Map To Groups".into(), "/help/map/".into()]);
    help_page.get(&["Video Help Topics".into(), "/help/video/".into()]);
    help_page.save(false)?;

    let page_ids = db.map("help_page", &["title"], "id")?;
    let mut page_video = db.table("help_page_video", &["help_page_id", "video_id"]);

    let getting_started: Option<i64> = conn
        .query_row(
            "SELECT id FROM video WHERE title = 'Getting Started'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    let tour_videos = pile_and_group_videos(conn)?;

    let mut link = |page_title: &str, video_id: i64| {
        if let Some(page_id) = page_ids.get(&Value::from(page_title)) {
            page_video.get(&[page_id.clone(), video_id.into()]);
        }
    };
    if let Some(video_id) = getting_started {
        link("Getting Started", video_id);
        link("Video Help Topics", video_id);
    }
    for video_id in &tour_videos {
        link("Advanced Map To Groups", *video_id);
        link("Video Help Topics", *video_id);
    }
    page_video.save(false)?;

    create_glossary_pages(db, reporter)?;
    Ok(())
}

/// Register a glossary page per initial letter and join each term to its
/// page; single-letter terms would just repeat the page title, so they
/// are left out of the joins
fn create_glossary_pages(db: &Database, reporter: &dyn Reporter) -> Result<()> {
    let conn = db.connection();
    let mut terms: Vec<String> = Vec::new();
    {
        let mut stmt = conn.prepare("SELECT term FROM glossary_term")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            terms.push(row.get(0)?);
        }
    }

    let letters: BTreeSet<char> = terms
        .iter()
        .filter_map(|t| t.chars().next())
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    let mut glossary_page = db.table("glossary_help_page", &["letter"]);
    for letter in &letters {
        glossary_page
            .get(&[letter.to_string().into()])
            .set("title", format!("Glossary: {}", letter.to_ascii_uppercase()))
            .set("url_path", format!("/help/glossary/{}/", letter));
    }
    let outcome = glossary_page.save(false)?;
    reporter.info(&format!("Registered glossary pages: {}", outcome));

    let page_ids = db.map("glossary_help_page", &["letter"], "id")?;
    let term_ids = db.map("glossary_term", &["term"], "id")?;

    let mut page_term = db.table(
        "glossary_help_page_term",
        &["glossary_help_page_id", "glossary_term_id"],
    );
    for term in &terms {
        if term.chars().count() < 2 {
            continue;
        }
        let letter = match term.chars().next() {
            Some(c) if c.is_ascii_alphabetic() => c.to_ascii_lowercase().to_string(),
            _ => continue,
        };
        let page_id = page_ids.get(&Value::from(letter.as_str()));
        let term_id = term_ids.get(&Value::from(term.as_str()));
        if let (Some(page_id), Some(term_id)) = (page_id, term_id) {
            page_term.get(&[page_id.clone(), term_id.clone()]);
        }
    }
    page_term.save(false)?;
    Ok(())
}

/// Videos attached to any pile group or pile, groups first
fn pile_and_group_videos(conn: &Connection) -> Result<Vec<i64>> {
    let mut videos = Vec::new();
    for sql in [
        "SELECT v.id FROM video v
           JOIN pile_group pg ON pg.video_id = v.id
          WHERE v.youtube_id != '' ORDER BY pg.name",
        "SELECT v.id FROM video v
           JOIN pile p ON p.video_id = v.id
          WHERE v.youtube_id != '' ORDER BY p.name",
    ] {
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            videos.push(row.get(0)?);
        }
    }
    Ok(videos)
}

/// Create the three levels of Simple Key page records
pub fn import_simple_key_pages(db: &Database, reporter: &dyn Reporter) -> Result<()> {
    reporter.info("Setting up Simple Key pages");
    let conn = db.connection();

    let mut groups_list = db.table("groups_list_page", &["title", "main_heading"]);
    groups_list.get(&[
        "Simple Key for Plant Identification".into(),
        "Which group best describes your plant?".into(),
    ]);
    groups_list.save(false)?;

    let page_id: i64 = conn.query_row(
        "SELECT id FROM groups_list_page
          WHERE title = 'Simple Key for Plant Identification'",
        [],
        |r| r.get(0),
    )?;

    let mut page_group = db.table(
        "groups_list_page_group",
        &["groups_list_page_id", "pile_group_id"],
    );
    let mut subgroups_list = db.table(
        "subgroups_list_page",
        &["title", "main_heading", "pile_group_id"],
    );
    {
        let mut stmt = conn.prepare("SELECT id, friendly_title FROM pile_group ORDER BY id")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let group_id: i64 = row.get(0)?;
            let friendly_title: String = row.get(1)?;
            page_group.get(&[page_id.into(), group_id.into()]);
            subgroups_list.get(&[
                format!("{}: Simple Key", friendly_title).into(),
                "Is your plant in one of these subgroups?".into(),
                group_id.into(),
            ]);
        }
    }
    page_group.save(false)?;
    subgroups_list.save(false)?;

    let mut results = db.table("subgroup_results_page", &["title", "main_heading", "pile_id"]);
    {
        let mut stmt = conn.prepare(
            "SELECT p.id, p.friendly_title, pg.friendly_title
               FROM pile p JOIN pile_group pg ON p.pile_group_id = pg.id
              ORDER BY p.id",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let pile_id: i64 = row.get(0)?;
            let pile_title: String = row.get(1)?;
            let group_title: String = row.get(2)?;
            results.get(&[
                format!("{}: {}: Simple Key", pile_title, group_title).into(),
                pile_title.into(),
                pile_id.into(),
            ]);
        }
    }
    results.save(false)?;
    Ok(())
}

/// Assign each pile its preview characters: the two place characters that
/// every pile carries, then the pile's default filter characters in their
/// question order
pub fn import_plant_preview_characters(
    db: &Database,
    characters_csv: &Path,
    reporter: &dyn Reporter,
) -> Result<()> {
    reporter.info("Setting up plant preview characters");
    let conn = db.connection();

    let partner_id: Option<i64> = conn
        .query_row(
            "SELECT id FROM partner_site WHERE short_name = 'gobotany'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    let partner_id = match partner_id {
        Some(id) => id,
        None => {
            reporter.error("No gobotany partner site; skipping preview characters");
            return Ok(());
        }
    };

    let character_ids = db.map("character", &["short_name"], "id")?;
    let mut preview = db.table(
        "plant_preview_character",
        &["pile_id", "character_id", "display_order", "partner_site_id"],
    );

    let mut piles: Vec<(i64, String)> = Vec::new();
    {
        let mut stmt = conn.prepare("SELECT id, name FROM pile ORDER BY id")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            piles.push((row.get(0)?, row.get(1)?));
        }
    }

    for (pile_id, pile_name) in &piles {
        let mut short_names = vec![
            "habitat_general".to_string(),
            "state_distribution".to_string(),
        ];
        short_names.extend(default_filter_characters(characters_csv, pile_name)?);

        for (order, short_name) in short_names.iter().enumerate() {
            let character_id = match character_ids.get(&Value::from(short_name.as_str())) {
                Some(id) => id.clone(),
                None => {
                    reporter.error(&format!("Character does not exist: {}", short_name));
                    continue;
                }
            };
            preview.get(&[
                (*pile_id).into(),
                character_id,
                (order as i64).into(),
                partner_id.into(),
            ]);
        }
    }

    preview.save(false)?;
    Ok(())
}

/// Short names of a pile's default filter characters, ordered by their
/// default-question rank (a string, compared as such) then short name
fn default_filter_characters(characters_csv: &Path, pile_name: &str) -> Result<Vec<String>> {
    let mut filters: Vec<(String, String)> = Vec::new();
    for row in open_csv(characters_csv)? {
        let row = row?;
        if !row.field("pile").eq_ignore_ascii_case(pile_name) {
            continue;
        }
        if row.field("default_question").is_empty() {
            continue;
        }
        filters.push((
            row.field("default_question").to_string(),
            character_short_name(row.field("character")),
        ));
    }
    filters.sort();
    Ok(filters.into_iter().map(|(_, short_name)| short_name).collect())
}

// A page title like "Woody Plants: Simple Key" yields the phrases
// "woody plants" and "simple key"; connecting words start a new phrase.
static PHRASE_SPLIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r", |\band |\bfor |\bwith |: ").unwrap()
});

const WORDS_TO_REMOVE: [&str; 7] = ["all", "others", "other", "long", "plus", "herbaceous", "\""];
const PREFIXES_TO_OMIT: [&str; 8] = [
    "plants", "relatives", "related", "no", "lacking", "leaves", "stems", "obvious",
];
const MAX_SUGGESTION_LENGTH: usize = 30;

/// Break a page title or heading into short lowercase search phrases
fn phrase_suggestions(input: &str) -> Vec<String> {
    PHRASE_SPLIT
        .split(input)
        .map(|piece| {
            let mut piece = piece.to_lowercase();
            for word in WORDS_TO_REMOVE {
                piece = piece.replace(word, "");
            }
            piece.trim().to_string()
        })
        .filter(|piece| !piece.is_empty())
        .filter(|piece| piece.chars().count() < MAX_SUGGESTION_LENGTH)
        .filter(|piece| !PREFIXES_TO_OMIT.iter().any(|p| piece.starts_with(p)))
        .collect()
}

/// Rebuild the search suggestion table from everything nameable
pub fn import_search_suggestions(db: &Database, reporter: &dyn Reporter) -> Result<()> {
    reporter.info("Setting up search suggestions");
    let conn = db.connection();

    let mut terms: BTreeSet<String> = BTreeSet::new();
    for sql in [
        "SELECT name FROM family",
        "SELECT common_name FROM family",
        "SELECT name FROM genus",
        "SELECT scientific_name FROM taxon",
        "SELECT common_name FROM common_name",
        "SELECT scientific_name FROM synonym",
        "SELECT name FROM pile_group",
        "SELECT name FROM pile",
        "SELECT term FROM glossary_term",
        "SELECT friendly_name FROM character",
    ] {
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let term: String = row.get(0)?;
            if !term.is_empty() {
                terms.insert(term.to_lowercase());
            }
        }
    }

    // Phrases drawn from the Simple Key pages.
    for sql in [
        "SELECT title FROM groups_list_page",
        "SELECT friendly_name FROM pile_group",
        "SELECT friendly_title FROM pile_group",
        "SELECT friendly_name FROM pile",
        "SELECT friendly_title FROM pile",
    ] {
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let text: String = row.get(0)?;
            terms.extend(phrase_suggestions(&text));
        }
    }

    let mut suggestion = db.table("search_suggestion", &["term"]);
    for term in &terms {
        suggestion.get(&[term.as_str().into()]);
    }
    let outcome = suggestion.save(true)?;
    reporter.info(&format!("Search suggestions: {}", outcome));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_phrase_suggestions_splits_on_connectives() {
        let phrases = phrase_suggestions("Ferns and Horsetails");
        assert_eq!(phrases, vec!["ferns", "horsetails"]);
    }

    #[test]
    fn test_phrase_suggestions_drops_junk_words_and_prefixes() {
        assert!(phrase_suggestions("All other plants").is_empty());
        let phrases = phrase_suggestions("Woody Plants: Simple Key");
        assert_eq!(phrases, vec!["woody plants", "simple key"]);
    }

    #[test]
    fn test_phrase_suggestions_omits_long_phrases() {
        let long = "a phrase that runs well past the length cutoff";
        assert!(phrase_suggestions(long).is_empty());
    }
}

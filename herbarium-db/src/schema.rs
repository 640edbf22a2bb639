//! Destination table definitions

use rusqlite::Connection;

use herbarium_core::HerbariumResult;

/// Create every destination table that the importers write.
///
/// Surrogate ids everywhere; natural-key uniqueness is enforced by the
/// staging layer's reconcile pass, not by the schema.
pub fn ensure_schema(conn: &Connection) -> HerbariumResult<()> {
    conn.execute_batch(TAXONOMY_SCHEMA)?;
    conn.execute_batch(KEY_SCHEMA)?;
    conn.execute_batch(REFERENCE_SCHEMA)?;
    conn.execute_batch(IMAGE_SCHEMA)?;
    conn.execute_batch(PAGES_SCHEMA)?;
    Ok(())
}

const TAXONOMY_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS family (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL DEFAULT '',
    common_name TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    slug TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS genus (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL DEFAULT '',
    common_name TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    slug TEXT NOT NULL DEFAULT '',
    family_id INTEGER REFERENCES family(id)
);

CREATE TABLE IF NOT EXISTS taxon (
    id INTEGER PRIMARY KEY,
    scientific_name TEXT NOT NULL DEFAULT '',
    family_id INTEGER REFERENCES family(id),
    genus_id INTEGER REFERENCES genus(id),
    taxonomic_authority TEXT NOT NULL DEFAULT '',
    habitat TEXT NOT NULL DEFAULT '',
    habitat_general TEXT NOT NULL DEFAULT '',
    factoid TEXT NOT NULL DEFAULT '',
    wetland_indicator_code TEXT NOT NULL DEFAULT '',
    wetland_indicator_text TEXT NOT NULL DEFAULT '',
    north_american_native INTEGER,
    north_american_introduced INTEGER,
    distribution TEXT NOT NULL DEFAULT '',
    invasive_in_states TEXT NOT NULL DEFAULT '',
    sale_prohibited_in_states TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    variety_notes TEXT NOT NULL DEFAULT '',
    conservation_status_ct TEXT NOT NULL DEFAULT '',
    conservation_status_ma TEXT NOT NULL DEFAULT '',
    conservation_status_me TEXT NOT NULL DEFAULT '',
    conservation_status_nh TEXT NOT NULL DEFAULT '',
    conservation_status_ri TEXT NOT NULL DEFAULT '',
    conservation_status_vt TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS common_name (
    id INTEGER PRIMARY KEY,
    common_name TEXT NOT NULL DEFAULT '',
    taxon_id INTEGER REFERENCES taxon(id)
);

CREATE TABLE IF NOT EXISTS synonym (
    id INTEGER PRIMARY KEY,
    scientific_name TEXT NOT NULL DEFAULT '',
    full_name TEXT NOT NULL DEFAULT '',
    taxon_id INTEGER REFERENCES taxon(id)
);

CREATE TABLE IF NOT EXISTS plant_name (
    id INTEGER PRIMARY KEY,
    scientific_name TEXT NOT NULL DEFAULT '',
    common_name TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS distribution (
    id INTEGER PRIMARY KEY,
    scientific_name TEXT NOT NULL DEFAULT '',
    state TEXT NOT NULL DEFAULT '',
    county TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT ''
);
"#;

const KEY_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS pile_group (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL DEFAULT '',
    slug TEXT NOT NULL DEFAULT '',
    friendly_name TEXT NOT NULL DEFAULT '',
    friendly_title TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    key_characteristics TEXT NOT NULL DEFAULT '',
    notable_exceptions TEXT NOT NULL DEFAULT '',
    video_id INTEGER REFERENCES video(id)
);

CREATE TABLE IF NOT EXISTS pile (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL DEFAULT '',
    slug TEXT NOT NULL DEFAULT '',
    pile_group_id INTEGER REFERENCES pile_group(id),
    friendly_name TEXT NOT NULL DEFAULT '',
    friendly_title TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    key_characteristics TEXT NOT NULL DEFAULT '',
    notable_exceptions TEXT NOT NULL DEFAULT '',
    video_id INTEGER REFERENCES video(id)
);

CREATE TABLE IF NOT EXISTS pile_species (
    id INTEGER PRIMARY KEY,
    pile_id INTEGER REFERENCES pile(id),
    taxon_id INTEGER REFERENCES taxon(id)
);

CREATE TABLE IF NOT EXISTS character_group (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS character (
    id INTEGER PRIMARY KEY,
    short_name TEXT NOT NULL DEFAULT '',
    name TEXT NOT NULL DEFAULT '',
    friendly_name TEXT NOT NULL DEFAULT '',
    character_group_id INTEGER REFERENCES character_group(id),
    pile_id INTEGER REFERENCES pile(id),
    value_type TEXT NOT NULL DEFAULT '',
    unit TEXT NOT NULL DEFAULT '',
    ease_of_observability INTEGER,
    question TEXT NOT NULL DEFAULT '',
    hint TEXT NOT NULL DEFAULT '',
    image TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS character_value (
    id INTEGER PRIMARY KEY,
    character_id INTEGER REFERENCES character(id),
    value_str TEXT NOT NULL DEFAULT '',
    value_min REAL,
    value_max REAL,
    friendly_text TEXT NOT NULL DEFAULT '',
    image TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS taxon_character_value (
    id INTEGER PRIMARY KEY,
    taxon_id INTEGER REFERENCES taxon(id),
    character_value_id INTEGER REFERENCES character_value(id)
);
"#;

const REFERENCE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS habitat (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL DEFAULT '',
    friendly_name TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS wetland_indicator (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL DEFAULT '',
    name TEXT NOT NULL DEFAULT '',
    friendly_description TEXT NOT NULL DEFAULT '',
    sequence INTEGER
);

CREATE TABLE IF NOT EXISTS copyright_holder (
    id INTEGER PRIMARY KEY,
    coded_name TEXT NOT NULL DEFAULT '',
    expanded_name TEXT NOT NULL DEFAULT '',
    copyright TEXT NOT NULL DEFAULT '',
    source TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS glossary_term (
    id INTEGER PRIMARY KEY,
    term TEXT NOT NULL DEFAULT '',
    lay_definition TEXT NOT NULL DEFAULT '',
    hint TEXT NOT NULL DEFAULT '',
    question_text TEXT NOT NULL DEFAULT '',
    visible INTEGER NOT NULL DEFAULT 1,
    is_highlighted INTEGER NOT NULL DEFAULT 0,
    image TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS lookalike (
    id INTEGER PRIMARY KEY,
    taxon_id INTEGER REFERENCES taxon(id),
    lookalike_scientific_name TEXT NOT NULL DEFAULT '',
    lookalike_characteristic TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS video (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL DEFAULT '',
    youtube_id TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS partner_site (
    id INTEGER PRIMARY KEY,
    short_name TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS partner_species (
    id INTEGER PRIMARY KEY,
    taxon_id INTEGER REFERENCES taxon(id),
    partner_id INTEGER REFERENCES partner_site(id),
    simple_key INTEGER NOT NULL DEFAULT 1
);
"#;

const IMAGE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS image_type (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS content_image (
    id INTEGER PRIMARY KEY,
    image TEXT NOT NULL DEFAULT '',
    alt TEXT NOT NULL DEFAULT '',
    creator TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    content_type TEXT NOT NULL DEFAULT '',
    object_id INTEGER,
    image_type_id INTEGER REFERENCES image_type(id),
    rank INTEGER
);

CREATE TABLE IF NOT EXISTS home_page_image (
    id INTEGER PRIMARY KEY,
    image TEXT NOT NULL DEFAULT '',
    display_order INTEGER
);
"#;

const PAGES_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS search_suggestion (
    id INTEGER PRIMARY KEY,
    term TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS help_page (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL DEFAULT '',
    url_path TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS help_page_video (
    id INTEGER PRIMARY KEY,
    help_page_id INTEGER REFERENCES help_page(id),
    video_id INTEGER REFERENCES video(id)
);

CREATE TABLE IF NOT EXISTS glossary_help_page (
    id INTEGER PRIMARY KEY,
    letter TEXT NOT NULL DEFAULT '',
    title TEXT NOT NULL DEFAULT '',
    url_path TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS glossary_help_page_term (
    id INTEGER PRIMARY KEY,
    glossary_help_page_id INTEGER REFERENCES glossary_help_page(id),
    glossary_term_id INTEGER REFERENCES glossary_term(id)
);

CREATE TABLE IF NOT EXISTS groups_list_page (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL DEFAULT '',
    main_heading TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS groups_list_page_group (
    id INTEGER PRIMARY KEY,
    groups_list_page_id INTEGER REFERENCES groups_list_page(id),
    pile_group_id INTEGER REFERENCES pile_group(id)
);

CREATE TABLE IF NOT EXISTS subgroups_list_page (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL DEFAULT '',
    main_heading TEXT NOT NULL DEFAULT '',
    pile_group_id INTEGER REFERENCES pile_group(id)
);

CREATE TABLE IF NOT EXISTS subgroup_results_page (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL DEFAULT '',
    main_heading TEXT NOT NULL DEFAULT '',
    pile_id INTEGER REFERENCES pile(id)
);

CREATE TABLE IF NOT EXISTS plant_preview_character (
    id INTEGER PRIMARY KEY,
    pile_id INTEGER REFERENCES pile(id),
    character_id INTEGER REFERENCES character(id),
    partner_site_id INTEGER REFERENCES partner_site(id),
    display_order INTEGER
);
"#;

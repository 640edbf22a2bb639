//! Pile and pile-group video import

use std::path::Path;

use anyhow::Result;
use rusqlite::OptionalExtension;

use herbarium_core::Reporter;
use herbarium_db::{Database, Value};

use crate::rows::open_csv;

/// Load pile and pile-group video ids from a CSV file.
///
/// Existing video assignments are cleared first so the file is the whole
/// truth; a video with no title inherits the name of the pile or group it
/// is assigned to.
pub fn import_videos(db: &Database, path: &Path, reporter: &dyn Reporter) -> Result<()> {
    reporter.info(&format!("Loading videos from file: {}", path.display()));

    let conn = db.connection();
    conn.execute("UPDATE pile_group SET video_id = NULL", [])?;
    conn.execute("UPDATE pile SET video_id = NULL", [])?;

    let mut video_table = db.table("video", &["youtube_id"]);
    for row in open_csv(path)? {
        let row = row?;
        let youtube_id = row.field("youtube-id");
        if youtube_id.is_empty() {
            reporter.error(&format!(
                "Video row without a youtube id: {:?}",
                row.field("title")
            ));
            continue;
        }
        video_table
            .get(&[youtube_id.into()])
            .set("title", row.field("title"));
    }
    video_table.save(false)?;

    let video_map = db.map("video", &["youtube_id"], "id")?;

    // Second pass assigns the saved videos to their piles and groups.
    for row in open_csv(path)? {
        let row = row?;
        let youtube_id = row.field("youtube-id");
        let target = row.field("pile-or-subpile");
        if youtube_id.is_empty() || target.is_empty() {
            continue;
        }
        let video_id = match video_map.get(&Value::from(youtube_id)) {
            Some(id) => id.clone(),
            None => continue,
        };

        let assigned_to: Option<String> = assign_video(conn, target, &video_id)?;
        match assigned_to {
            Some(name) => {
                // Backfill an empty video title with the assignee's name.
                conn.execute(
                    "UPDATE video SET title = ? WHERE youtube_id = ? AND title = ''",
                    [name.as_str(), youtube_id],
                )?;
            }
            None => reporter.error(&format!(
                "No pile or pile group named {:?} for video {}",
                target, youtube_id
            )),
        }
    }

    Ok(())
}

/// Attach a video to the named pile group, or failing that the named
/// pile; returns the assignee's name
fn assign_video(
    conn: &rusqlite::Connection,
    name: &str,
    video_id: &Value,
) -> Result<Option<String>> {
    let group: Option<String> = conn
        .query_row("SELECT name FROM pile_group WHERE name = ?", [name], |r| {
            r.get(0)
        })
        .optional()?;
    if let Some(group_name) = group {
        conn.execute(
            "UPDATE pile_group SET video_id = ? WHERE name = ?",
            rusqlite::params![video_id, name],
        )?;
        return Ok(Some(group_name));
    }

    let pile: Option<String> = conn
        .query_row("SELECT name FROM pile WHERE name = ?", [name], |r| r.get(0))
        .optional()?;
    if let Some(pile_name) = pile {
        conn.execute(
            "UPDATE pile SET video_id = ? WHERE name = ?",
            rusqlite::params![video_id, name],
        )?;
        return Ok(Some(pile_name));
    }

    Ok(None)
}

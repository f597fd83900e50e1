//! Persistence of simplified content as one JSON file per run.
//!
//! Files are named `<subject>_<grade>_<topic>_<timestamp>.json`, written to a
//! hidden temp file and hard-linked into place. An existing file is never
//! overwritten: a `-2`, `-3`, ... suffix is added instead.

use std::path::{Path, PathBuf};

use edugen_shared::{EdugenError, Result, SimplifiedContent};
use tracing::{debug, info};

/// Timestamp layout used in output filenames (millisecond precision).
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%3f";

/// Per-field slug cap; keeps names well under the 255-byte filename limit
/// with the timestamp, run id and suffixes added.
const MAX_SLUG_CHARS: usize = 50;

/// Write `content` into `dir` and return the final path.
pub fn write_content(dir: &Path, content: &SimplifiedContent) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| EdugenError::io(dir, e))?;

    let json = serde_json::to_string_pretty(content)
        .map_err(|e| EdugenError::validation(format!("JSON serialization failed: {e}")))?;

    let stem = file_stem(content);
    let temp = dir.join(format!(".{stem}.{}.tmp", content.metadata.run_id));
    std::fs::write(&temp, json).map_err(|e| EdugenError::io(&temp, e))?;
    debug!(path = %temp.display(), "wrote temp file");

    let linked = link_unique(&temp, dir, &stem);
    let _ = std::fs::remove_file(&temp);
    let target = linked?;

    info!(path = %target.display(), "content saved");
    Ok(target)
}

/// Link `temp` to the first free `{stem}.json`, `{stem}-2.json`, ...
///
/// `hard_link` fails on an existing target, so a file is never replaced.
fn link_unique(temp: &Path, dir: &Path, stem: &str) -> Result<PathBuf> {
    let mut target = dir.join(format!("{stem}.json"));
    let mut n = 1;
    loop {
        match std::fs::hard_link(temp, &target) {
            Ok(()) => return Ok(target),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                n += 1;
                target = dir.join(format!("{stem}-{n}.json"));
            }
            Err(e) => return Err(EdugenError::io(&target, e)),
        }
    }
}

/// Filename stem for `content`, without extension or collision suffix.
pub fn file_stem(content: &SimplifiedContent) -> String {
    format!(
        "{}_{}_{}_{}",
        slugify(&content.subject),
        slugify(&content.grade_level),
        slugify(&content.topic),
        content.metadata.generated_at.format(TIMESTAMP_FORMAT)
    )
}

/// Keep ASCII alphanumerics, collapse everything else into single `_`,
/// cut at [`MAX_SLUG_CHARS`].
fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_SLUG_CHARS));
    for c in s.chars() {
        if out.len() >= MAX_SLUG_CHARS {
            break;
        }
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_end_matches('_');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

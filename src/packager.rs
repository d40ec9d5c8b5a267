//! Packaging a finished run into a Markdown document on disk.

use crate::types::{RunResult, Theme};
use crate::{error::Result, PipelineError};
use chrono::{DateTime, TimeZone};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name of the folder documents are saved to under the home directory.
pub const DOWNLOADS: &str = "Downloads";

/// Prefix the theme header onto the pipeline output.
///
/// The body is appended verbatim, so two different bodies never produce
/// the same document.
pub fn package(theme: &Theme, body: &str) -> String {
    format!("# Theme: {}\n\n---\n\n{}", theme, body)
}

/// Write `document` to `path` atomically.
///
/// The bytes go to a sibling temporary file which is then renamed over
/// `path`. On failure the temporary is removed and `path` is untouched.
pub fn write_to_file(path: &Path, document: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            PipelineError::InvalidConfig(format!("Not a file path: {}", path.display()))
        })?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    let written = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(document.as_bytes())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, path)
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// `$HOME/Downloads`, created if it does not exist.
pub fn downloads_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| {
        PipelineError::Configuration("Could not determine the home directory".to_string())
    })?;
    ensure_downloads(&home)
}

fn ensure_downloads(home: &Path) -> Result<PathBuf> {
    let dir = home.join(DOWNLOADS);
    if !dir.is_dir() {
        tracing::info!(path = %dir.display(), "creating downloads folder");
        fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

/// Resolve the folder a run will be saved to: `explicit` if given, else
/// [`downloads_dir`]. The folder is created and checked for writes, so a
/// bad destination is reported before any LLM call is made.
pub fn prepare_output_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    let dir = match explicit {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|e| unwritable(dir, e))?;
            dir.to_path_buf()
        }
        None => downloads_dir()?,
    };
    let check = dir.join(".article-topics-write-check");
    fs::File::create(&check)
        .and_then(|_| fs::remove_file(&check))
        .map_err(|e| unwritable(&dir, e))?;
    Ok(dir)
}

fn unwritable(dir: &Path, err: std::io::Error) -> PipelineError {
    PipelineError::Configuration(format!(
        "Output folder {} is not writable: {}",
        dir.display(),
        err
    ))
}

/// Walk up from `start` and return the first ancestor that directly holds a
/// `Downloads` (or `Download`) directory.
pub fn probe_downloads(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        ["Downloads", "Download"]
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_dir())
    })
}

/// `Article_Topic_Generated_{D-M-YYYY_H-M-S}.md`, without zero padding.
pub fn document_file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "Article_Topic_Generated_{}.md",
        now.format("%-d-%-m-%Y_%-H-%-M-%-S")
    )
}

/// `article_topics_{theme}_{D_M_YYYY_H_M_S}.md` with spaces in the theme
/// replaced by underscores. Used for web downloads.
pub fn download_file_name<Tz: TimeZone>(theme: &Theme, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let safe: String = theme
        .as_str()
        .chars()
        .map(|c| match c {
            c if c.is_whitespace() => '_',
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c => c,
        })
        .collect();
    format!(
        "article_topics_{}_{}.md",
        safe,
        now.format("%-d_%-m_%Y_%-H_%-M_%-S")
    )
}

/// Package `result` and write it into `dir`. Returns the written path.
pub fn save_run<Tz: TimeZone>(result: &RunResult, dir: &Path, now: &DateTime<Tz>) -> Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    fs::create_dir_all(dir)?;
    let path = dir.join(document_file_name(now));
    write_to_file(&path, &package(&result.theme, &result.content))?;
    tracing::info!(path = %path.display(), bytes = result.content.len(), "saved document");
    Ok(path)
}

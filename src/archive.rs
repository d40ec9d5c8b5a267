//! Zip, unzip and purge helper for generated files.
//!
//! Archives are named `zipped_file_<D-M-YYYY_H-M-S>.zip` so they can later
//! be found and removed by [`purge`] with [`default_purge_pattern`].

use crate::error::Result;
use chrono::{DateTime, TimeZone};
use regex::Regex;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// File name prefix of every archive this module creates.
pub const ARCHIVE_PREFIX: &str = "zipped_file_";

static PURGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{}", regex::escape(ARCHIVE_PREFIX))).unwrap());

/// `^zipped_file_`, matched against file names.
pub fn default_purge_pattern() -> Regex {
    PURGE_PATTERN.clone()
}

/// Archive name for a given moment.
pub fn archive_file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}{}.zip", ARCHIVE_PREFIX, now.format("%-d-%-m-%Y_%-H-%-M-%-S"))
}

/// Zip `file` into `out_dir` as a single deflated entry named after the
/// file's base name. Returns the archive path.
pub fn archive<Tz: TimeZone>(file: &Path, out_dir: &Path, now: &DateTime<Tz>) -> Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    let mut source = File::open(file)?;
    let entry_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "source has no file name"))?
        .to_string();

    fs::create_dir_all(out_dir)?;
    let target = out_dir.join(archive_file_name(now));

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(File::create(&target)?);
    writer.start_file(entry_name.as_str(), options)?;
    io::copy(&mut source, &mut writer)?;
    writer.finish()?;

    tracing::info!(source = %file.display(), archive = %target.display(), "archived file");
    Ok(target)
}

/// Extract every entry of `archive` into `dest`.
///
/// Returns the paths of the extracted files (directories are not listed).
pub fn extract(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let mut zip = ZipArchive::new(File::open(archive)?)?;

    let mut files = Vec::new();
    for i in 0..zip.len() {
        let entry = zip.by_index(i)?;
        if entry.is_file() {
            if let Some(name) = entry.enclosed_name() {
                files.push(dest.join(name));
            }
        }
    }

    fs::create_dir_all(dest)?;
    zip.extract(dest)?;
    tracing::info!(archive = %archive.display(), dest = %dest.display(), files = files.len(), "extracted archive");
    Ok(files)
}

/// Delete every file under `root` whose file name matches `pattern`.
///
/// Does nothing and returns 0 unless `confirmed` is true. Otherwise returns
/// the number of files removed.
pub fn purge(root: &Path, pattern: &Regex, confirmed: bool) -> Result<usize> {
    if !confirmed {
        tracing::info!("purge not confirmed, nothing deleted");
        return Ok(0);
    }

    let mut removed = 0;
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| pattern.is_match(name));
        if matches {
            tracing::info!(path = %entry.path().display(), "deleting file");
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }

    if removed == 0 {
        tracing::info!(root = %root.display(), "no matching files found, nothing deleted");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PipelineError;
    use chrono::{NaiveDate, Utc};
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2025, 6, 4)
            .unwrap()
            .and_hms_opt(14, 3, 9)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_archive_name() {
        assert_eq!(archive_file_name(&now()), "zipped_file_4-6-2025_14-3-9.zip");
        assert!(default_purge_pattern().is_match(&archive_file_name(&now())));
    }

    #[test]
    fn test_archive_then_extract_round_trips() {
        let work = TempDir::new().unwrap();
        let src = work.path().join("topics.md");
        let body = "# Theme: Rust\n\n---\n\n## Topic 1\n".repeat(50);
        fs::write(&src, &body).unwrap();

        let zip_path = archive(&src, work.path(), &now()).unwrap();
        assert_eq!(zip_path.file_name().unwrap(), "zipped_file_4-6-2025_14-3-9.zip");

        let out = work.path().join("out");
        let files = extract(&zip_path, &out).unwrap();
        assert_eq!(files, vec![out.join("topics.md")]);
        assert_eq!(fs::read_to_string(&files[0]).unwrap(), body);
    }

    #[test]
    fn test_archive_missing_source() {
        let work = TempDir::new().unwrap();
        let err = archive(&work.path().join("nope.md"), work.path(), &now()).unwrap_err();
        match err {
            PipelineError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_extract_corrupt_archive() {
        let work = TempDir::new().unwrap();
        let bogus = work.path().join("zipped_file_bad.zip");
        fs::write(&bogus, b"definitely not a zip").unwrap();
        let err = extract(&bogus, &work.path().join("out")).unwrap_err();
        assert!(matches!(err, PipelineError::Archive(_)));
    }

    #[test]
    fn test_purge_unconfirmed_deletes_nothing() {
        let work = TempDir::new().unwrap();
        fs::write(work.path().join("zipped_file_a.zip"), b"a").unwrap();
        assert_eq!(purge(work.path(), &default_purge_pattern(), false).unwrap(), 0);
        assert!(work.path().join("zipped_file_a.zip").exists());
    }

    #[test]
    fn test_purge_confirmed_removes_matches_only() {
        let work = TempDir::new().unwrap();
        let nested = work.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(work.path().join("zipped_file_a.zip"), b"a").unwrap();
        fs::write(nested.join("zipped_file_b.zip"), b"b").unwrap();
        fs::write(work.path().join("other.txt"), b"keep").unwrap();

        let removed = purge(work.path(), &default_purge_pattern(), true).unwrap();
        assert_eq!(removed, 2);
        assert!(work.path().join("other.txt").exists());
        assert!(!work.path().join("zipped_file_a.zip").exists());
        assert!(!nested.join("zipped_file_b.zip").exists());
    }

    #[test]
    fn test_purge_matches_file_name_not_path() {
        let work = TempDir::new().unwrap();
        let dir = work.path().join("zipped_file_dir");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("inner.txt"), b"keep").unwrap();
        assert_eq!(purge(work.path(), &default_purge_pattern(), true).unwrap(), 0);
        assert!(dir.join("inner.txt").exists());
    }
}

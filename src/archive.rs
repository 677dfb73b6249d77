//! Snapshot archive format: a gzip-compressed tar stream whose first entry is
//! `metadata.json`, followed by the project files under root-relative,
//! forward-slash names.
use crate::metadata::SnapshotMetadata;
use crate::util::archive_name;
use anyhow::{anyhow, bail, Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use tar::{Archive, Builder, EntryType, Header};

pub const METADATA_FILE: &str = "metadata.json";

/// Write `files` (all under `root`) and `meta` into a new snapshot at `out`.
///
/// A failure part-way through leaves the partial archive behind.
pub fn create_archive(
    root: &Path,
    files: &[PathBuf],
    meta: &SnapshotMetadata,
    out: &Path,
) -> Result<()> {
    let start = Instant::now();
    let file = File::create(out).with_context(|| format!("create snapshot {}", out.display()))?;
    let mut tar = Builder::new(GzEncoder::new(file, Compression::default()));

    let body = serde_json::to_string_pretty(meta).context("serialize snapshot metadata")?;
    let mut header = Header::new_ustar();
    header.set_size(body.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_cksum();
    tar.append_data(&mut header, METADATA_FILE, body.as_bytes())
        .context("write metadata.json")?;

    for path in files {
        let name = archive_name(root, path);
        tracing::debug!(entry = %name, "archiving");
        tar.append_path_with_name(path, &name)
            .with_context(|| format!("archive {}", path.display()))?;
    }

    let encoder = tar.into_inner().context("finish tar stream")?;
    encoder.finish().context("finish gzip stream")?;
    tracing::info!(
        out = %out.display(),
        files = files.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "snapshot written"
    );
    Ok(())
}

/// Extract `snapshot` into `dest` and return its metadata.
///
/// Entries whose names are absolute or climb out of `dest` are skipped with a
/// warning, as are links and other special entries.
pub fn unpack(snapshot: &Path, dest: &Path) -> Result<SnapshotMetadata> {
    let start = Instant::now();
    fs::create_dir_all(dest).with_context(|| format!("create {}", dest.display()))?;
    let mut archive = open_archive(snapshot)?;
    let mut metadata: Option<SnapshotMetadata> = None;

    let entries = archive
        .entries()
        .with_context(|| format!("read snapshot {}", snapshot.display()))?;
    for entry in entries {
        let mut entry = entry.with_context(|| format!("read snapshot {}", snapshot.display()))?;
        let raw_name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let rel = match clean_entry_name(&raw_name) {
            EntryName::Inside(rel) => rel,
            EntryName::Empty => continue,
            EntryName::Rejected => {
                tracing::warn!(entry = %raw_name, "skipping archive entry outside the sandbox");
                continue;
            }
        };
        let target = dest.join(&rel);

        match entry.header().entry_type() {
            EntryType::Directory => {
                fs::create_dir_all(&target)
                    .with_context(|| format!("create {}", target.display()))?;
            }
            EntryType::Regular | EntryType::Continuous => {
                let mut contents = Vec::new();
                entry
                    .read_to_end(&mut contents)
                    .with_context(|| format!("read entry {raw_name}"))?;
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("create {}", parent.display()))?;
                }
                fs::write(&target, &contents)
                    .with_context(|| format!("write {}", target.display()))?;
                apply_mode(&target, entry.header().mode().ok())?;

                if metadata.is_none() && is_metadata_name(&rel) {
                    metadata = Some(parse_metadata(&contents)?);
                }
            }
            other => {
                tracing::debug!(entry = %raw_name, kind = ?other, "skipping non-regular entry");
            }
        }
    }

    let metadata = metadata.ok_or_else(missing_metadata)?;
    tracing::info!(
        snapshot = %snapshot.display(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "snapshot unpacked"
    );
    Ok(metadata)
}

/// Read only the metadata of `snapshot`; nothing is written to disk.
pub fn read_metadata(snapshot: &Path) -> Result<SnapshotMetadata> {
    let mut archive = open_archive(snapshot)?;
    let entries = archive
        .entries()
        .with_context(|| format!("read snapshot {}", snapshot.display()))?;
    for entry in entries {
        let mut entry = entry.with_context(|| format!("read snapshot {}", snapshot.display()))?;
        let raw_name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let EntryName::Inside(rel) = clean_entry_name(&raw_name) else {
            continue;
        };
        if !entry.header().entry_type().is_file() || !is_metadata_name(&rel) {
            continue;
        }
        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .with_context(|| format!("read entry {raw_name}"))?;
        let mut meta = parse_metadata(&contents)?;
        meta.normalize();
        return Ok(meta);
    }
    Err(missing_metadata())
}

fn open_archive(snapshot: &Path) -> Result<Archive<GzDecoder<File>>> {
    let file =
        File::open(snapshot).with_context(|| format!("open snapshot {}", snapshot.display()))?;
    Ok(Archive::new(GzDecoder::new(file)))
}

fn parse_metadata(contents: &[u8]) -> Result<SnapshotMetadata> {
    let mut meta: SnapshotMetadata =
        serde_json::from_slice(contents).context("parse snapshot metadata.json")?;
    meta.normalize();
    Ok(meta)
}

fn missing_metadata() -> anyhow::Error {
    anyhow!("invalid snapshot: {METADATA_FILE} not found")
}

fn is_metadata_name(rel: &Path) -> bool {
    rel.file_name().is_some_and(|name| name == METADATA_FILE)
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: Option<u32>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let Some(mode) = mode else {
        return Ok(());
    };
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
        .with_context(|| format!("set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: Option<u32>) -> Result<()> {
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum EntryName {
    Inside(PathBuf),
    Empty,
    Rejected,
}

/// Lexically clean an archive entry name relative to the extraction root.
fn clean_entry_name(name: &str) -> EntryName {
    let mut parts: Vec<OsString> = Vec::new();
    for component in Path::new(name).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => return EntryName::Rejected,
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return EntryName::Rejected;
                }
            }
            Component::Normal(part) => parts.push(part.to_os_string()),
        }
    }
    if parts.is_empty() {
        return EntryName::Empty;
    }
    EntryName::Inside(parts.iter().collect())
}

/// Fail unless `path` looks like a snapshot file; used to give a clearer
/// message than a gzip decoding error.
pub fn ensure_snapshot_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("snapshot {} not found", path.display());
    }
    Ok(())
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;

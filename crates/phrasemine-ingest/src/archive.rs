//! Bundle expansion: each `<name>.tgz` becomes a sibling `<name>/` shard directory.

use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, info, warn};

use phrasemine_core::{Error, Result, ShardName};

const BUNDLE_SUFFIXES: &[&str] = &[".tar.gz", ".tgz"];
const STAGING_SUFFIX: &str = ".partial";

/// Outcome of one extraction pass over a bundle directory.
#[derive(Debug, Default, Clone)]
pub struct ArchiveReport {
    /// Bundles expanded during this pass.
    pub extracted: Vec<String>,
    /// Bundles whose shard directory already existed.
    pub skipped: Vec<String>,
    /// Bundles that could not be expanded, with the reason.
    pub failed: Vec<(String, String)>,
}

/// Expand every bundle in `dir` that has no shard directory yet.
///
/// A corrupt bundle is logged and recorded in the report; the remaining
/// bundles are still processed. Only an unreadable `dir` is an error.
pub fn extract_bundles(dir: &Path) -> Result<ArchiveReport> {
    let mut report = ArchiveReport::default();
    let mut bundles = Vec::new();
    for entry in std::fs::read_dir(dir)
        .map_err(|e| Error::Archive(format!("read {}: {}", dir.display(), e)))?
    {
        let path = entry?.path();
        if path.is_file() && bundle_stem(&path).is_some() {
            bundles.push(path);
        }
    }
    bundles.sort();

    for bundle in bundles {
        let Some(stem) = bundle_stem(&bundle) else {
            continue;
        };
        let target = dir.join(&stem);
        if target.is_dir() {
            debug!("Bundle {} already expanded", bundle.display());
            report.skipped.push(stem);
            continue;
        }

        info!("Extracting bundle {}", bundle.display());
        match extract_bundle(&bundle, &target) {
            Ok(()) => report.extracted.push(stem),
            Err(e) => {
                warn!("Skipping bundle {}: {}", bundle.display(), e);
                report.failed.push((stem, e.to_string()));
            }
        }
    }

    info!(
        "Bundles: extracted={}, already expanded={}, failed={}",
        report.extracted.len(),
        report.skipped.len(),
        report.failed.len()
    );
    Ok(report)
}

/// Unpack into a staging directory and rename it into place on success.
pub fn extract_bundle(bundle: &Path, target: &Path) -> Result<()> {
    let staging = staging_dir(target);
    if staging.exists() {
        std::fs::remove_dir_all(&staging)?;
    }
    std::fs::create_dir_all(&staging)?;

    let unpacked = File::open(bundle)
        .map_err(|e| Error::Archive(format!("open {}: {}", bundle.display(), e)))
        .and_then(|file| {
            let mut archive = tar::Archive::new(GzDecoder::new(file));
            archive
                .unpack(&staging)
                .map_err(|e| Error::Archive(format!("unpack {}: {}", bundle.display(), e)))
        });

    if let Err(e) = unpacked {
        let _ = std::fs::remove_dir_all(&staging);
        return Err(e);
    }

    if let Err(e) = std::fs::rename(&staging, target) {
        let _ = std::fs::remove_dir_all(&staging);
        return Err(Error::Archive(format!(
            "move {} into place: {}",
            bundle.display(),
            e
        )));
    }
    Ok(())
}

/// Shard directories under `dir`: sub-directories whose name has no `.`.
pub fn shard_directories(dir: &Path) -> Result<Vec<ShardName>> {
    let mut shards = Vec::new();
    if !dir.is_dir() {
        return Ok(shards);
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if !name.contains('.') {
                shards.push(name.to_string());
            }
        }
    }
    shards.sort();
    Ok(shards)
}

/// Shard name for a bundle path, or `None` if it is not a bundle.
fn bundle_stem(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    BUNDLE_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

fn staging_dir(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(STAGING_SUFFIX);
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    fn write_bundle(dir: &Path, name: &str, files: &[(&str, &str)]) {
        let file = File::create(dir.join(name)).unwrap();
        let gz = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(gz);
        for (path, body) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(body.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path, body.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_bundle_stem() {
        assert_eq!(bundle_stem(Path::new("a/ongoing_1.tgz")).as_deref(), Some("ongoing_1"));
        assert_eq!(bundle_stem(Path::new("b.tar.gz")).as_deref(), Some("b"));
        assert_eq!(bundle_stem(Path::new("c.zip")), None);
        assert_eq!(bundle_stem(Path::new(".tgz")), None);
    }

    #[test]
    fn test_extracts_once_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(
            dir.path(),
            "shard_a.tgz",
            &[("US1.xml", "<abstract>one</abstract>"), ("US2.xml", "<abstract>two</abstract>")],
        );

        let first = extract_bundles(dir.path()).unwrap();
        assert_eq!(first.extracted, vec!["shard_a"]);
        assert!(dir.path().join("shard_a").join("US1.xml").is_file());

        let second = extract_bundles(dir.path()).unwrap();
        assert!(second.extracted.is_empty());
        assert_eq!(second.skipped, vec!["shard_a"]);
        assert!(second.failed.is_empty());
    }

    #[test]
    fn test_corrupt_bundle_does_not_stop_others() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.tgz"), b"definitely not gzip").unwrap();
        write_bundle(dir.path(), "good.tgz", &[("US1.xml", "<abstract>ok</abstract>")]);

        let report = extract_bundles(dir.path()).unwrap();
        assert_eq!(report.extracted, vec!["good"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "broken");
        assert!(!dir.path().join("broken").exists());
        assert!(!dir.path().join("broken.partial").exists());
        assert_eq!(shard_directories(dir.path()).unwrap(), vec!["good"]);
    }

    #[test]
    fn test_failed_move_into_place_removes_staging() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), "shard_b.tgz", &[("US1.xml", "<abstract>b</abstract>")]);
        let target = dir.path().join("shard_b");
        std::fs::write(&target, "occupied").unwrap();

        let result = extract_bundle(&dir.path().join("shard_b.tgz"), &target);
        assert!(matches!(result, Err(Error::Archive(_))));
        assert!(!dir.path().join("shard_b.partial").exists());
        assert!(target.is_file());
    }

    #[test]
    fn test_shard_directories_skip_dotted_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("ongoing_2")).unwrap();
        std::fs::create_dir(dir.path().join("ongoing_1")).unwrap();
        std::fs::create_dir(dir.path().join("stale.partial")).unwrap();
        std::fs::write(dir.path().join("loose.xml"), "").unwrap();

        assert_eq!(
            shard_directories(dir.path()).unwrap(),
            vec!["ongoing_1", "ongoing_2"]
        );
        assert!(shard_directories(&dir.path().join("missing")).unwrap().is_empty());
    }
}

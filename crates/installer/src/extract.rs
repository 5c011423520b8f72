//! Binary extraction from release archives.
//!
//! Upstream projects name the executable inside their archives
//! inconsistently (`gum_0.14.5_Linux_x86_64/gum`, `yq_linux_amd64`,
//! `sg`), so members are matched on their base file name rather than on a
//! full path. The first matching regular file wins.

use dcx_core::ArchiveKind;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tar::Archive;
use tracing::{debug, trace};

use crate::{Error, Result};

/// Extra member-name prefixes accepted for specific binaries.
const MEMBER_PREFIX_EXCEPTIONS: &[(&str, &str)] = &[("yq", "yq_")];

/// True if an archive member's base name should be taken as `expected`.
#[must_use]
pub fn matches_binary_name(file_name: &str, expected: &str) -> bool {
    if file_name == expected {
        return true;
    }

    if file_name
        .strip_prefix(expected)
        .is_some_and(|rest| rest.starts_with('_') || rest.starts_with('-'))
    {
        return true;
    }

    MEMBER_PREFIX_EXCEPTIONS
        .iter()
        .any(|(binary, prefix)| *binary == expected && file_name.starts_with(prefix))
}

/// Extract the member matching `expected` from `archive` to `dest`.
///
/// The member is streamed to a hidden sibling of `dest`, marked executable
/// and renamed into place, so `dest` is either the complete new binary or
/// untouched.
///
/// # Errors
///
/// Returns [`Error::ExtractionFailed`] when the archive is unreadable or has
/// no matching member, and [`Error::Io`] when the destination cannot be
/// written.
pub fn extract(archive: &Path, kind: ArchiveKind, expected: &str, dest: &Path) -> Result<()> {
    debug!(archive = %archive.display(), ?kind, %expected, dest = %dest.display(), "Extracting binary");

    let staging = staging_path(dest);
    let result = match kind {
        ArchiveKind::TarGz => extract_tar_gz(archive, expected, &staging),
        ArchiveKind::Zip => extract_zip(archive, expected, &staging),
    }
    .and_then(|member| {
        make_executable(&staging)?;
        std::fs::rename(&staging, dest).map_err(|e| Error::io(e, dest, "rename"))?;
        Ok(member)
    });

    match result {
        Ok(member) => {
            debug!(%member, dest = %dest.display(), "Extracted binary");
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::remove_file(&staging);
            Err(e)
        }
    }
}

fn staging_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map_or_else(|| "binary".into(), |n| n.to_string_lossy());
    dest.with_file_name(format!(".{name}.tmp"))
}

fn extract_tar_gz(archive: &Path, expected: &str, staging: &Path) -> Result<String> {
    let file = File::open(archive).map_err(|e| Error::io(e, archive, "open"))?;
    let mut tar = Archive::new(GzDecoder::new(file));

    let entries = tar
        .entries()
        .map_err(|e| Error::extraction_failed(expected, format!("Failed to read tar: {e}")))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| {
            Error::extraction_failed(expected, format!("Failed to read tar entry: {e}"))
        })?;

        if !entry.header().entry_type().is_file() {
            continue;
        }

        let member = entry
            .path()
            .map_err(|e| Error::extraction_failed(expected, format!("Invalid path in tar: {e}")))?
            .to_string_lossy()
            .into_owned();
        trace!(%member, "Checking tar member");

        if matches_binary_name(base_name(&member), expected) {
            write_member(&mut entry, expected, staging)?;
            return Ok(member);
        }
    }

    Err(Error::extraction_failed(expected, "no matching member in archive"))
}

fn extract_zip(archive: &Path, expected: &str, staging: &Path) -> Result<String> {
    let file = File::open(archive).map_err(|e| Error::io(e, archive, "open"))?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| Error::extraction_failed(expected, format!("Failed to open zip: {e}")))?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| {
            Error::extraction_failed(expected, format!("Failed to read zip entry: {e}"))
        })?;

        if !entry.is_file() {
            continue;
        }

        let member = entry.name().to_string();
        trace!(%member, "Checking zip member");

        if matches_binary_name(base_name(&member), expected) {
            write_member(&mut entry, expected, staging)?;
            return Ok(member);
        }
    }

    Err(Error::extraction_failed(expected, "no matching member in archive"))
}

fn base_name(member: &str) -> &str {
    member
        .trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(member)
}

fn write_member(reader: &mut impl Read, expected: &str, staging: &Path) -> Result<()> {
    let mut out = File::create(staging).map_err(|e| Error::io(e, staging, "create"))?;
    std::io::copy(reader, &mut out).map_err(|e| {
        Error::extraction_failed(expected, format!("Failed to read archive member: {e}"))
    })?;
    Ok(())
}

fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| Error::io(e, path, "chmod"))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

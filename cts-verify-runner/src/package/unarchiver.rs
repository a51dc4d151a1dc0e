// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::{PackageExtractError, UnknownArchiveFormat};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::{
    fs,
    io::{self, BufReader, Read},
    time::Instant,
};

/// The compression of a submission package.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArchiveFormat {
    /// A gzip-compressed tarball.
    TarGz,
    /// A zstd-compressed tarball.
    TarZst,
    /// An uncompressed tarball.
    Tar,
}

impl ArchiveFormat {
    /// Recognized file extensions and their formats.
    pub const SUPPORTED_FORMATS: &'static [(&'static str, Self)] = &[
        (".tgz", Self::TarGz),
        (".tar.gz", Self::TarGz),
        (".tar.zst", Self::TarZst),
        (".tar", Self::Tar),
    ];

    /// Determines the format from the archive's file name.
    pub fn autodetect(archive_file: &Utf8Path) -> Result<Self, UnknownArchiveFormat> {
        let file_name = archive_file.file_name().unwrap_or("");
        let lowercase = file_name.to_ascii_lowercase();
        Self::SUPPORTED_FORMATS
            .iter()
            .find(|(extension, _)| lowercase.ends_with(extension))
            .map(|(_, format)| *format)
            .ok_or_else(|| UnknownArchiveFormat {
                file_name: file_name.to_owned(),
            })
    }
}

/// Information about an extracted package.
#[derive(Clone, Debug)]
pub struct ExtractInfo {
    /// The directory the package was extracted to.
    pub dest_dir: Utf8PathBuf,
    /// The number of archive entries extracted.
    pub entry_count: usize,
}

/// Extracts the package at `archive` into `dest`, creating `dest` if necessary.
///
/// Entries must have UTF-8 paths made of plain names; anything that could escape `dest` is
/// rejected.
pub fn extract_package(
    archive: &Utf8Path,
    dest: &Utf8Path,
) -> Result<ExtractInfo, PackageExtractError> {
    let format = ArchiveFormat::autodetect(archive)?;
    let read_err = |err| PackageExtractError::Read {
        archive: archive.to_owned(),
        err,
    };

    fs::create_dir_all(dest).map_err(|err| PackageExtractError::DestDirCreate {
        dir: dest.to_owned(),
        err,
    })?;

    let start_time = Instant::now();
    let file = fs::File::open(archive).map_err(read_err)?;
    let reader = decoder(file, format).map_err(read_err)?;
    let mut tar = tar::Archive::new(reader);

    let mut entry_count = 0;
    for entry in tar.entries().map_err(read_err)? {
        let mut entry = entry.map_err(read_err)?;
        let path = entry_path(&entry)?;
        if path.as_str().is_empty() {
            continue;
        }

        entry
            .unpack_in(dest)
            .map_err(|err| PackageExtractError::WriteFile { path, err })?;
        entry_count += 1;
    }

    tracing::debug!(
        "extracted {entry_count} entries from `{archive}` to `{dest}` in {:?}",
        start_time.elapsed()
    );
    Ok(ExtractInfo {
        dest_dir: dest.to_owned(),
        entry_count,
    })
}

fn decoder(file: fs::File, format: ArchiveFormat) -> io::Result<Box<dyn Read>> {
    let reader = BufReader::new(file);
    Ok(match format {
        ArchiveFormat::TarGz => Box::new(flate2::read::GzDecoder::new(reader)),
        ArchiveFormat::TarZst => Box::new(zstd::Decoder::with_buffer(reader)?),
        ArchiveFormat::Tar => Box::new(reader),
    })
}

/// Returns the entry's path, normalized to drop `.` components.
fn entry_path<R: Read>(entry: &tar::Entry<'_, R>) -> Result<Utf8PathBuf, PackageExtractError> {
    let path_bytes = entry.path_bytes();
    let path_str = std::str::from_utf8(&path_bytes)
        .map_err(|_| PackageExtractError::NonUtf8Path(path_bytes.to_vec()))?;
    let path = Utf8Path::new(path_str);

    let mut normalized = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::Normal(name) => normalized.push(name),
            Utf8Component::CurDir => {}
            other => {
                return Err(PackageExtractError::InvalidComponent {
                    path: path.to_owned(),
                    component: other.as_str().to_owned(),
                });
            }
        }
    }
    Ok(normalized)
}

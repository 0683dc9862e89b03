//! Archive decoding for the bulk upload endpoint.

use std::io::{self, Read};

use bytes::Bytes;
use flate2::read::GzDecoder;

/// A regular file read from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Entry {
    pub path: String,
    pub data: Bytes,
}

/// Compression of an uploaded tar archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Compression {
    None,
    Gzip,
}

impl Compression {
    /// Map the `extract-archive` query value. `tar.bz2` is not handled.
    pub(super) fn from_query(value: &str) -> Option<Self> {
        match value {
            "tar" => Some(Self::None),
            "tar.gz" => Some(Self::Gzip),
            _ => None,
        }
    }
}

/// Read every regular file from `body`. Directories and other entry types
/// are skipped.
pub(super) fn read_archive(body: &[u8], compression: Compression) -> io::Result<Vec<Entry>> {
    match compression {
        Compression::None => read_entries(body),
        Compression::Gzip => read_entries(GzDecoder::new(body)),
    }
}

fn read_entries<R: Read>(reader: R) -> io::Result<Vec<Entry>> {
    let mut archive = tar::Archive::new(reader);
    let mut entries = Vec::new();
    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path()?.to_string_lossy().into_owned();
        let size = entry.size();
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        if data.len() as u64 != size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{path}: truncated entry"),
            ));
        }
        entries.push(Entry {
            path,
            data: Bytes::from(data),
        });
    }
    Ok(entries)
}

/// Build a tar archive. Used by tests.
#[cfg(test)]
pub(crate) fn write_tar(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, data) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, path, *data)
            .expect("append tar entry");
    }
    builder.into_inner().expect("finish tar archive")
}

/// Build a gzip-compressed tar archive. Used by tests.
#[cfg(test)]
pub(crate) fn write_tar_gz(files: &[(&str, &[u8])]) -> Vec<u8> {
    use std::io::Write;

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&write_tar(files)).expect("compress tar archive");
    encoder.finish().expect("finish gzip stream")
}

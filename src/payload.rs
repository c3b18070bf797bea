//! `PayloadEncoder` collaborator (SPEC_FULL.md §11): compresses local file
//! paths into an opaque base64 blob. A pure `paths -> blob` function with no
//! cluster I/O, as the core expects (spec.md §1 "Out of scope").

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::SubmitError;

pub trait PayloadEncoder: Send + Sync {
    /// Returns `None` for an empty path list, matching the optional
    /// `filesBlob`/`jarsBlob` fields of `SubmissionRequest` (spec.md §3).
    fn encode(&self, paths: &[PathBuf]) -> Result<Option<String>, SubmitError>;
}

pub struct TarGzPayloadEncoder;

impl PayloadEncoder for TarGzPayloadEncoder {
    fn encode(&self, paths: &[PathBuf]) -> Result<Option<String>, SubmitError> {
        if paths.is_empty() {
            return Ok(None);
        }

        let gz = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(gz);
        for path in paths {
            let name = file_name_of(path);
            builder.append_path_with_name(path, name)?;
        }
        let gz = builder.into_inner()?;
        let bytes = gz.finish()?;
        Ok(Some(BASE64.encode(bytes)))
    }
}

fn file_name_of(path: &Path) -> &Path {
    path.file_name().map(Path::new).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn empty_path_list_yields_no_blob() {
        let encoder = TarGzPayloadEncoder;
        assert!(encoder.encode(&[]).unwrap().is_none());
    }

    #[test]
    fn encodes_files_into_a_base64_blob() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("job.jar");
        std::fs::File::create(&file_path).unwrap().write_all(b"hello").unwrap();

        let encoder = TarGzPayloadEncoder;
        let blob = encoder.encode(&[file_path]).unwrap().unwrap();
        assert!(!blob.is_empty());
        assert!(BASE64.decode(&blob).is_ok());
    }
}

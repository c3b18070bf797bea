//! C7 — `SubmissionRequestBuilder` (spec.md §4.7).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::SubmitError;
use crate::payload::PayloadEncoder;
use crate::types::{AppResource, SubmissionRequest};

/// Resolves the main-resource URI per spec.md §4.7 steps 1-4: absent scheme
/// is treated as `file`, `local` becomes a container-local path, anything
/// else is a remote URL.
pub fn resolve_app_resource(main_resource: &str) -> Result<AppResource, SubmitError> {
    match url::Url::parse(main_resource) {
        Ok(parsed) if parsed.scheme() == "local" => Ok(AppResource::ContainerLocal {
            path: main_resource.to_string(),
        }),
        Ok(parsed) if parsed.scheme() == "file" => read_uploaded(Path::new(parsed.path())),
        Ok(_) => Ok(AppResource::Remote {
            uri: main_resource.to_string(),
        }),
        Err(_) => read_uploaded(Path::new(main_resource)),
    }
}

/// The filesystem path a main-resource string would be read from, for
/// pre-flight existence checks (spec.md §4.8.1 phase 1) without doing the
/// actual read.
pub fn local_path_of(main_resource: &str) -> PathBuf {
    match url::Url::parse(main_resource) {
        Ok(parsed) if parsed.scheme() == "file" => PathBuf::from(parsed.path()),
        _ => PathBuf::from(main_resource),
    }
}

fn read_uploaded(path: &Path) -> Result<AppResource, SubmitError> {
    if !path.is_file() {
        return Err(SubmitError::LocalFileMissing(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    Ok(AppResource::Uploaded {
        name,
        blob_base64: BASE64.encode(bytes),
    })
}

pub struct SubmissionRequestBuilder<'a> {
    pub encoder: &'a dyn PayloadEncoder,
}

impl<'a> SubmissionRequestBuilder<'a> {
    pub fn build(
        &self,
        main_resource: &str,
        main_class: &str,
        args: Vec<String>,
        files: &[PathBuf],
        jars: &[PathBuf],
        secret: String,
        properties: BTreeMap<String, String>,
    ) -> Result<SubmissionRequest, SubmitError> {
        let app = resolve_app_resource(main_resource)?;
        let files_blob = self.encoder.encode(files)?;
        let jars_blob = self.encoder.encode(jars)?;

        Ok(SubmissionRequest {
            app,
            main_class: main_class.to_string(),
            args,
            secret,
            properties,
            files_blob,
            jars_blob,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn absent_scheme_reads_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"binary").unwrap();
        let resource = resolve_app_resource(file.path().to_str().unwrap()).unwrap();
        assert!(matches!(resource, AppResource::Uploaded { .. }));
    }

    #[test]
    fn missing_local_file_fails() {
        let result = resolve_app_resource("/no/such/path.jar");
        assert!(matches!(result, Err(SubmitError::LocalFileMissing(_))));
    }

    #[test]
    fn local_scheme_becomes_container_local() {
        let resource = resolve_app_resource("local:///opt/app/job.jar").unwrap();
        assert_eq!(
            resource,
            AppResource::ContainerLocal {
                path: "local:///opt/app/job.jar".to_string()
            }
        );
    }

    #[test]
    fn other_scheme_becomes_remote() {
        let resource = resolve_app_resource("https://example.com/job.jar").unwrap();
        assert_eq!(
            resource,
            AppResource::Remote {
                uri: "https://example.com/job.jar".to_string()
            }
        );
    }
}

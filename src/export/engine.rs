//! Typst rendering engine.
//!
//! Writes a [`TypstJob`] into a temporary directory, invokes the Typst CLI
//! and reads the produced PDF back.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use tempfile::{tempdir, TempDir};

use super::ExportError;

const MAIN_FILE: &str = "main.typ";
const OUTPUT_FILE: &str = "output.pdf";

/// Binary file the Typst source refers to by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Everything needed to compile one document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypstJob {
    pub source: String,
    pub assets: Vec<Asset>,
}

impl TypstJob {
    pub fn new(source: String) -> Self {
        Self {
            source,
            assets: Vec::new(),
        }
    }

    pub fn with_asset(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.assets.push(Asset {
            name: name.into(),
            bytes,
        });
        self
    }
}

#[derive(Debug, Clone)]
pub struct TypstRenderEngine {
    binary: PathBuf,
    font_path: Option<PathBuf>,
}

impl Default for TypstRenderEngine {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("typst"),
            font_path: None,
        }
    }
}

impl TypstRenderEngine {
    pub fn new(binary: impl Into<PathBuf>, font_path: Option<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            font_path,
        }
    }

    /// Compile `job` to PDF bytes.
    pub fn render(&self, job: &TypstJob) -> Result<Vec<u8>, ExportError> {
        let temp_dir = tempdir().map_err(ExportError::TempDir)?;

        fs::write(temp_dir.path().join(MAIN_FILE), &job.source)
            .map_err(ExportError::WriteSource)?;
        for asset in &job.assets {
            fs::write(temp_dir.path().join(&asset.name), &asset.bytes)
                .map_err(ExportError::WriteAsset)?;
        }

        self.compile(&temp_dir)
    }

    fn compile(&self, temp_dir: &TempDir) -> Result<Vec<u8>, ExportError> {
        let output_path = temp_dir.path().join(OUTPUT_FILE);

        let mut command = Command::new(&self.binary);
        command
            .arg("compile")
            .arg(MAIN_FILE)
            .arg(OUTPUT_FILE)
            .current_dir(temp_dir.path());
        if let Some(font_path) = &self.font_path {
            command.arg("--font-path").arg(font_path);
        }

        let output = command.output().map_err(ExportError::TypstIo)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            log::error!("Typst compile failed: {}", stderr);
            return Err(ExportError::TypstExit {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        fs::read(&output_path).map_err(ExportError::ReadPdf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_an_io_error() {
        let engine = TypstRenderEngine::new("/nonexistent/typst-binary", None);
        let job = TypstJob::new("= Hello".into());
        assert!(matches!(engine.render(&job), Err(ExportError::TypstIo(_))));
    }

    #[test]
    fn test_job_collects_assets() {
        let job = TypstJob::new("#image(\"photo.jpg\")".into()).with_asset("photo.jpg", vec![1, 2]);
        assert_eq!(job.assets.len(), 1);
        assert_eq!(job.assets[0].name, "photo.jpg");
    }
}

//! External conversion of arbitrary raster formats to PNM

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::errors::ImageError;

/// Turns an image file into a binary PNM stream
pub trait RasterConverter {
    fn to_pnm(&self, path: &Path) -> Result<Vec<u8>, ImageError>;
}

/// Runs netpbm's `anytopnm <path>` and captures its standard output.
///
/// The program is started directly, without a shell.
#[derive(Debug, Clone)]
pub struct Anytopnm {
    program: OsString,
}

impl Default for Anytopnm {
    fn default() -> Self {
        Self {
            program: OsString::from("anytopnm"),
        }
    }
}

impl Anytopnm {
    /// Use a different executable with the same calling convention
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl RasterConverter for Anytopnm {
    fn to_pnm(&self, path: &Path) -> Result<Vec<u8>, ImageError> {
        debug!(program = ?self.program, path = %path.display(), "running raster converter");
        let output = Command::new(&self.program)
            .arg(path)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| ImageError::Converter {
                message: format!("cannot run {}: {}", self.program.to_string_lossy(), e),
            })?;
        if !output.status.success() {
            return Err(ImageError::Converter {
                message: format!("{} failed ({})", self.program.to_string_lossy(), output.status),
            });
        }
        if output.stdout.is_empty() {
            return Err(ImageError::Converter {
                message: format!("{} produced no output", self.program.to_string_lossy()),
            });
        }
        Ok(output.stdout)
    }
}

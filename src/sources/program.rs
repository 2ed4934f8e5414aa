//! The external-program source: an installed whois client as fallback data

use crate::error::Error;
use crate::response::Response;
use crate::sources::Source;
use std::path::{Path, PathBuf};
use std::process::Command;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// The whois client shipped by most distributions.
pub const DEFAULT_PROGRAM: &str = "/usr/bin/whois";

/// Queries by running an external whois client and scanning its output
/// like any server reply.
pub struct ProgramSource {
    program: PathBuf,
}

impl ProgramSource {
    /// A source running `program`, or the distribution whois client when
    /// `program` is empty.
    pub fn new<P: AsRef<Path>>(program: P) -> Self {
        let program = program.as_ref();
        let program = if program.as_os_str().is_empty() {
            PathBuf::from(DEFAULT_PROGRAM)
        } else {
            program.to_path_buf()
        };
        Self { program }
    }
}

impl Source for ProgramSource {
    fn query(&self, resource: &str) -> Result<Response, Error> {
        debug!("Running {} for query on {}", self.program.display(), resource);
        let output = Command::new(&self.program)
            .arg(resource)
            .output()
            .inspect_err(|e| warn!("Failed to run {}: {e}", self.program.display()))?;
        if !output.status.success() {
            warn!(
                "{} failed on {} with {}",
                self.program.display(),
                resource,
                output.status
            );
            return Err(Error::Program {
                program: self.to_string(),
                status: output.status,
            });
        }
        if output.stdout.is_empty() {
            return Err(Error::NoData {
                source_name: self.to_string(),
            });
        }
        Ok(Response::parse(resource, output.stdout))
    }
}

impl std::fmt::Display for ProgramSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.display())
    }
}

use super::{Conversion, OutputFormat, StructureConverter};
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::*;

/// Drives the OPSIN command line (`java -jar opsin.jar -o<format> <in> <out>`).
///
/// Every call writes its request to a fresh temporary directory, which is removed when
/// the call returns, whichever way it returns.
#[derive(Debug, Clone)]
pub struct OpsinConverter {
    java: PathBuf,
    jar: PathBuf,
    work_dir: Option<PathBuf>,
    silent: bool,
}

impl OpsinConverter {
    pub fn new(jar: impl Into<PathBuf>) -> Self {
        Self {
            java: PathBuf::from("java"),
            jar: jar.into(),
            work_dir: None,
            silent: false,
        }
    }

    pub fn with_java(mut self, java: impl Into<PathBuf>) -> Self {
        self.java = java.into();
        self
    }

    /// Directory under which the per-call temporary directories are created.
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(work_dir.into());
        self
    }

    /// Discard OPSIN's own stdout/stderr instead of logging them.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Converts a batch, reporting transport failures as errors.
    pub fn try_convert_names(&self, names: &[String], format: OutputFormat) -> Result<Conversion> {
        // The request is one name per line, so a name spanning lines cannot be sent.
        let (sendable, unsendable): (Vec<&str>, Vec<&str>) = names
            .iter()
            .map(String::as_str)
            .partition(|name| !name.contains(|c: char| c == '\n' || c == '\r'));
        for name in &unsendable {
            debug!("Not sending multi-line name to OPSIN: {:?}", name);
        }
        if sendable.is_empty() {
            return Ok(Conversion::new());
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("opsin-");
        let dir = match &self.work_dir {
            Some(work_dir) => builder.tempdir_in(work_dir),
            None => builder.tempdir(),
        }
        .context("Failed to create OPSIN scratch directory")?;

        let request = dir.path().join("request.in");
        let response = dir.path().join("response.out");

        let mut file = File::create(&request).context("Failed to create OPSIN request file")?;
        for name in &sendable {
            writeln!(file, "{name}").context("Failed to write OPSIN request file")?;
        }
        file.flush()?;
        drop(file);

        self.run(&request, &response, format)?;

        let output = std::fs::read_to_string(&response)
            .context(format!("OPSIN wrote no readable output to {}", response.display()))?;
        Ok(pair_output(&sendable, &output))
    }

    /// Converts one name; `None` if OPSIN rejects it or cannot be run.
    pub fn convert_name(&self, name: &str, format: OutputFormat) -> Option<String> {
        let name = name.to_owned();
        self.convert_names(std::slice::from_ref(&name), format).remove(&name)
    }

    fn run(&self, request: &Path, response: &Path, format: OutputFormat) -> Result<()> {
        let mut command = Command::new(&self.java);
        command
            .arg("-jar")
            .arg(&self.jar)
            .arg(format!("-o{}", format.as_str()))
            .arg(request)
            .arg(response);
        debug!("Running {:?}", command);

        let status = if self.silent {
            command
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .context(format!("Failed to execute {}", self.java.display()))?
        } else {
            let output = command
                .output()
                .context(format!("Failed to execute {}", self.java.display()))?;
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stdout.trim().is_empty() {
                debug!("OPSIN stdout:\n{}", stdout.trim_end());
            }
            if !stderr.trim().is_empty() {
                debug!("OPSIN stderr:\n{}", stderr.trim_end());
            }
            output.status
        };

        if !status.success() && !response.exists() {
            bail!("OPSIN failed with status {} and wrote no output", status);
        }
        if !status.success() {
            warn!("OPSIN exited with status {}, reading partial output", status);
        }
        Ok(())
    }
}

impl StructureConverter for OpsinConverter {
    fn convert_names(&self, names: &[String], format: OutputFormat) -> Conversion {
        match self.try_convert_names(names, format) {
            Ok(conversion) => conversion,
            Err(e) => {
                error!("OPSIN conversion of {} names failed: {:#}", names.len(), e);
                Conversion::new()
            }
        }
    }
}

/// Pairs line `i` of an OPSIN response with request name `i`, keeping the non-blank lines.
pub fn pair_output(names: &[&str], output: &str) -> Conversion {
    names
        .iter()
        .zip(output.lines())
        .filter_map(|(name, line)| {
            let notation = line.trim();
            (!notation.is_empty()).then(|| (name.to_string(), notation.to_string()))
        })
        .collect()
}

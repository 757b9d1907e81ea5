//! Acoustic fingerprinting via Chromaprint's `fpcalc`
//!
//! Fingerprinting is best-effort. Every failure mode (missing binary,
//! timeout, non-zero exit, unreadable output) is reported as
//! `FingerprintOutcome::Absent` and never fails the path being indexed.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Result of a fingerprint attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FingerprintOutcome {
    /// Chromaprint fingerprint string
    Computed(String),
    /// No fingerprint; the reason is for logging only
    Absent(String),
}

impl FingerprintOutcome {
    pub fn fingerprint(&self) -> Option<&str> {
        match self {
            FingerprintOutcome::Computed(fp) => Some(fp.as_str()),
            FingerprintOutcome::Absent(_) => None,
        }
    }
}

/// Acoustic fingerprint collaborator
#[async_trait]
pub trait AcousticFingerprinter: Send + Sync {
    async fn fingerprint(&self, path: &Path) -> FingerprintOutcome;
}

/// `fpcalc -json` output
#[derive(Debug, Deserialize)]
struct FpcalcOutput {
    fingerprint: String,
}

/// Runs the `fpcalc` subprocess with a hard timeout
#[derive(Debug, Clone)]
pub struct FpcalcFingerprinter {
    binary: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl FpcalcFingerprinter {
    /// Create new fingerprinter
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            args: Vec::new(),
            timeout,
        }
    }

    /// Extra arguments placed before `-json <file>`
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn from_config(config: &indexer_common::config::FingerprintConfig) -> Self {
        Self::new(
            config.fpcalc_path.clone(),
            Duration::from_secs(config.timeout_secs),
        )
        .with_args(config.extra_args.clone())
    }
}

#[async_trait]
impl AcousticFingerprinter for FpcalcFingerprinter {
    async fn fingerprint(&self, path: &Path) -> FingerprintOutcome {
        let mut command = Command::new(&self.binary);
        command
            .args(&self.args)
            .arg("-json")
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        // Dropping the output future on timeout kills the child
        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => {
                return FingerprintOutcome::Absent(format!(
                    "fpcalc timed out after {} ms",
                    self.timeout.as_millis()
                ))
            }
            Ok(Err(e)) => {
                return FingerprintOutcome::Absent(format!(
                    "Failed to run {}: {}",
                    self.binary.display(),
                    e
                ))
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return FingerprintOutcome::Absent(format!(
                "fpcalc exit code {:?}: {}",
                output.status.code(),
                stderr.trim()
            ));
        }

        parse_fpcalc_output(&output.stdout)
    }
}

/// Parse `fpcalc -json` stdout
pub fn parse_fpcalc_output(stdout: &[u8]) -> FingerprintOutcome {
    match serde_json::from_slice::<FpcalcOutput>(stdout) {
        Ok(parsed) if !parsed.fingerprint.trim().is_empty() => {
            FingerprintOutcome::Computed(parsed.fingerprint)
        }
        Ok(_) => FingerprintOutcome::Absent("fpcalc returned an empty fingerprint".to_string()),
        Err(e) => FingerprintOutcome::Absent(format!("Unreadable fpcalc output: {}", e)),
    }
}

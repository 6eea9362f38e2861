//! Startup verification of the external transcription dependencies.
//!
//! Checks, in order: the binary answers a version query within a bounded
//! timeout, and the model asset exists. Fails fast with a specific reason
//! on the first failed check; the caller decides whether to fall back to
//! an alternate input method.

use crate::defaults;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

/// Outcome of the preflight check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightReport {
    pub available: bool,
    /// Specific reason for the first failed check; empty when available.
    pub reason: String,
}

impl PreflightReport {
    fn ok() -> Self {
        Self {
            available: true,
            reason: String::new(),
        }
    }

    fn unavailable(reason: String) -> Self {
        Self {
            available: false,
            reason,
        }
    }
}

/// Verify the external binary and model asset are present and runnable.
///
/// Idempotent and side-effect free beyond a transient version-probe
/// subprocess. May be cached by the caller or re-run per pipeline start.
pub async fn check_availability(binary: &str, model_path: &Path) -> PreflightReport {
    if let Some(reason) = check_binary(binary).await {
        return PreflightReport::unavailable(reason);
    }

    if !model_path.exists() {
        return PreflightReport::unavailable(format!(
            "speech model not found: {}",
            model_path.display()
        ));
    }

    PreflightReport::ok()
}

/// Probe `<binary> -version` under the preflight timeout.
///
/// ffmpeg uses single-dash `-version`; tools that ignore unknown
/// arguments and exit zero also pass, which is fine — the probe exists to
/// catch "not installed" and "not executable", not to validate features.
async fn check_binary(binary: &str) -> Option<String> {
    let mut probe = Command::new(binary);
    probe
        .arg("-version")
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        // A hung probe is reaped when the timeout drops the future
        .kill_on_drop(true);

    let timeout = Duration::from_secs(defaults::PREFLIGHT_TIMEOUT_SECS);
    match tokio::time::timeout(timeout, probe.status()).await {
        Ok(Ok(status)) if status.success() => None,
        Ok(Ok(status)) => Some(format!("'{}' version query failed: {}", binary, status)),
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            Some(format!("'{}' not installed or not in PATH", binary))
        }
        Ok(Err(e)) => Some(format!("failed to run '{}': {}", binary, e)),
        Err(_) => Some(format!(
            "'{}' version query timed out after {}s",
            binary,
            defaults::PREFLIGHT_TIMEOUT_SECS
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_missing_binary_fails_with_reason() {
        let model = NamedTempFile::new().unwrap();
        let report =
            check_availability("definitely-not-a-real-binary-9f2c", model.path()).await;
        assert!(!report.available);
        assert!(report.reason.contains("not installed"), "{}", report.reason);
    }

    #[tokio::test]
    async fn test_missing_model_fails_after_binary_check() {
        // `true` exits zero regardless of arguments
        let report =
            check_availability("true", Path::new("/nonexistent/model.bin")).await;
        assert!(!report.available);
        assert!(report.reason.contains("model"), "{}", report.reason);
    }

    #[tokio::test]
    async fn test_available_when_both_checks_pass() {
        let mut model = NamedTempFile::new().unwrap();
        model.write_all(b"stub model").unwrap();
        let report = check_availability("true", model.path()).await;
        assert!(report.available, "{}", report.reason);
        assert!(report.reason.is_empty());
    }

    #[tokio::test]
    async fn test_failing_binary_reports_status() {
        let model = NamedTempFile::new().unwrap();
        let report = check_availability("false", model.path()).await;
        assert!(!report.available);
        assert!(
            report.reason.contains("version query failed"),
            "{}",
            report.reason
        );
    }

    #[tokio::test]
    async fn test_binary_checked_before_model() {
        let report = check_availability(
            "definitely-not-a-real-binary-9f2c",
            Path::new("/nonexistent/model.bin"),
        )
        .await;
        assert!(
            report.reason.contains("not installed"),
            "binary failure must win: {}",
            report.reason
        );
    }
}

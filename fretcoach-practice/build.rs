//! Stamps the `fretcoach` binary with the identification it logs at startup
//!
//! Exposed to the crate as compile-time env vars:
//! - `GIT_HASH`: commit the binary was built from, or "unknown" outside a checkout
//! - `BUILD_TIMESTAMP`: UTC, RFC 3339, whole seconds
//! - `BUILD_PROFILE`: cargo profile (debug/release)

use std::process::Command;

const UNKNOWN: &str = "unknown";

/// Short commit hash of HEAD
fn head_commit() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}

fn main() {
    let stamps = [
        ("GIT_HASH", head_commit().unwrap_or_else(|| UNKNOWN.to_string())),
        (
            "BUILD_TIMESTAMP",
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        ),
        (
            "BUILD_PROFILE",
            std::env::var("PROFILE").unwrap_or_else(|_| UNKNOWN.to_string()),
        ),
    ];

    for (name, value) in stamps {
        println!("cargo:rustc-env={}={}", name, value);
    }
}

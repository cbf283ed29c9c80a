use std::env;
use std::process::Command;
use time::OffsetDateTime;

// Stamps the two values printed by `--version`.
fn main() {
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rustc-env=APP_BUILD_YEAR={}", build_year());
    println!("cargo:rustc-env=APP_VERSION_DISPLAY={}", display_version());
}

/// Honours SOURCE_DATE_EPOCH for reproducible builds
fn build_year() -> i32 {
    env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|raw| raw.parse::<i64>().ok())
        .and_then(|epoch| OffsetDateTime::from_unix_timestamp(epoch).ok())
        .unwrap_or_else(OffsetDateTime::now_utc)
        .year()
}

/// `0.1.0` for release builds, `0.1.0-dev+<commit>` otherwise
fn display_version() -> String {
    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    if env::var("PROFILE").as_deref() == Ok("release") {
        return version;
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    let commit = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    match commit {
        Some(commit) => format!("{version}-dev+{commit}"),
        None => format!("{version}-dev"),
    }
}

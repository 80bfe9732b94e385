use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    // Short git hash, shown by `plotturtle --version`
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .and_then(|o| {
            if o.status.success() {
                Some(String::from_utf8_lossy(&o.stdout).trim().to_string())
            } else {
                None
            }
        })
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=PLOTTURTLE_GIT_HASH={}", git_hash);

    let dirty = Command::new("git")
        .args(["diff", "--quiet"])
        .status()
        .map(|s| if s.success() { "clean" } else { "dirty" })
        .unwrap_or("unknown");
    println!("cargo:rustc-env=PLOTTURTLE_GIT_DIRTY={}", dirty);

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    println!("cargo:rustc-env=PLOTTURTLE_BUILD_UNIX={}", ts);
    println!("cargo:rerun-if-changed=build.rs");
}

use std::process::Command;

/// Short hash of the checked-out commit, or "unknown" outside a git tree.
fn commit_hash() -> String {
    Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    // `titres --version` reports the engine build it ran with.
    for watched in ["../../.git/HEAD", "../../.git/refs/heads"] {
        println!("cargo:rerun-if-changed={watched}");
    }
    println!("cargo:rustc-env=GIT_COMMIT_HASH={}", commit_hash());
}

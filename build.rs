// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    // Re-run build script if git HEAD changes
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=SELFIE_CAM_VERSION");

    // Packagers can pin the version explicitly
    let version = match std::env::var("SELFIE_CAM_VERSION") {
        Ok(v) => v,
        Err(_) => get_git_version(),
    };

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// Package version, suffixed with the short commit hash when building from git
fn get_git_version() -> String {
    let package_version = env!("CARGO_PKG_VERSION");

    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output();

    match output {
        Ok(output) if output.status.success() => {
            let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
            format!("{}-{}", package_version, hash)
        }
        _ => package_version.to_string(),
    }
}

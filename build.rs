use std::process::Command;

const VERSION_VAR: &str = "DMAKE_VERSION";

/// `git describe` output for builds from a checkout.
fn describe_checkout() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!version.is_empty()).then_some(version)
}

fn main() {
    // An explicit version from the environment wins over git.
    let version = std::env::var(VERSION_VAR)
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(describe_checkout);
    if let Some(version) = version {
        println!("cargo:rustc-env={VERSION_VAR}={version}");
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-env-changed={VERSION_VAR}");
}

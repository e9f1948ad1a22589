use std::process::Command;

fn git(args: &[&str]) -> Option<std::process::Output> {
    Command::new("git").args(args).output().ok()
}

/// Embeds the short commit hash so the startup banner can identify the
/// running build. Falls back to "unknown" outside a git checkout.
fn main() {
    let hash = git(&["rev-parse", "--short", "HEAD"])
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string());

    let version = match hash {
        Some(mut h) => {
            let clean = git(&["diff", "--quiet"])
                .map(|out| out.status.success())
                .unwrap_or(true);
            if !clean {
                h.push_str("-dirty");
            }
            h
        }
        None => "unknown".to_string(),
    };

    println!("cargo:rustc-env=GIT_HASH={version}");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads");
}

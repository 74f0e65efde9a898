fn main() {
    // git の状態が変わったらバージョン文字列を作り直す
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let described = std::process::Command::new("git")
        .args(["describe", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string());

    let pkg = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    let version = match described {
        Some(rev) if !rev.is_empty() => format!("{} ({})", pkg, rev),
        _ => pkg,
    };

    println!("cargo:rustc-env=RIG_TRACKER_VERSION={}", version);
}

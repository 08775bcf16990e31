use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    // The build id must change whenever the binary does. Cargo scans listed
    // directories recursively.
    for path in ["src", "schema", "Cargo.toml", "build.rs"] {
        println!("cargo:rerun-if-changed={}", path);
    }

    let build_id = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "dev".to_string());
    println!("cargo:rustc-env=DRACONIC_BUILD_ID={}", build_id);
}

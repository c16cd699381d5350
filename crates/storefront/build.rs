//! Build script for storefront crate.
//!
//! Computes content hashes for the static CSS and JS so templates can bust
//! browser caches with `?v=<hash>` while the files themselves are served with
//! long-lived cache headers.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        println!("cargo:warning=CARGO_MANIFEST_DIR is not set; asset hashes disabled");
        println!("cargo:rustc-env=CSS_HASH=dev");
        println!("cargo:rustc-env=JS_HASH=dev");
        return;
    };
    let static_dir = Path::new(&manifest_dir).join("static");

    hash_asset(&static_dir.join("css/main.css"), "CSS_HASH");
    hash_asset(&static_dir.join("js/storefront.js"), "JS_HASH");
}

/// Set `env_var` to the first 8 hex chars of the file's SHA-256.
fn hash_asset(path: &Path, env_var: &str) {
    println!("cargo:rerun-if-changed={}", path.display());

    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=Could not read {}: {e}", path.display());
            println!("cargo:rustc-env={env_var}=dev");
            return;
        }
    };

    let hash = format!("{:x}", Sha256::digest(&content));
    let short_hash = hash.get(..8).unwrap_or(&hash);

    println!("cargo:rustc-env={env_var}={short_hash}");
}

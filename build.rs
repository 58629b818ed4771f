// Copies the static page into `dist/` so it can be deployed alongside the
// wasm-pack output.
use std::env;
use std::path::Path;

use fs_extra::dir::{copy, CopyOptions};

fn main() {
    println!("cargo:rerun-if-changed=static");

    // The bundle itself is produced by wasm-pack; here we only mirror assets.
    if env::var("TARGET").unwrap_or_default() == "wasm32-unknown-unknown" {
        return;
    }

    let static_dir = Path::new("static");
    if !static_dir.exists() {
        return;
    }
    let out_dir = Path::new("dist");
    if out_dir.exists() {
        if let Err(err) = std::fs::remove_dir_all(out_dir) {
            println!("cargo:warning=could not clear dist/: {err}");
            return;
        }
    }

    let mut options = CopyOptions::new();
    options.content_only = true;
    let copied = std::fs::create_dir_all(out_dir)
        .map_err(fs_extra::error::Error::from)
        .and_then(|_| copy(static_dir, out_dir, &options));
    if let Err(err) = copied {
        println!("cargo:warning=could not copy static/ into dist/: {err}");
    }
}

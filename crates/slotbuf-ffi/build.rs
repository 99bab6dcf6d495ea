//! Regenerates `include/slotbuf.h` from the `extern "C"` surface.

use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("cargo sets CARGO_MANIFEST_DIR");
    let manifest_dir = Path::new(&manifest_dir);
    let header = manifest_dir.join("include").join("slotbuf.h");

    let config = cbindgen::Config::from_file(manifest_dir.join("cbindgen.toml"))
        .expect("cbindgen.toml is readable");
    std::fs::create_dir_all(header.parent().expect("header has a parent"))
        .expect("include/ is creatable");

    match cbindgen::generate_with_config(manifest_dir, config) {
        Ok(bindings) => {
            bindings.write_to_file(&header);
        }
        Err(e) => panic!("generating {}: {e}", header.display()),
    }
}

use std::{env, fs, path::{Path, PathBuf}};

const SETTINGS_FILENAME: &str = "settings.json";

fn main() {
    println!("cargo:rerun-if-changed={SETTINGS_FILENAME}");

    // Settings are optional; the server falls back to defaults and env vars.
    if !Path::new(SETTINGS_FILENAME).exists() {
        return;
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let target_dir = out_dir
        .ancestors()
        .nth(3)
        .expect("OUT_DIR sits three levels below the profile directory");

    fs::copy(SETTINGS_FILENAME, target_dir.join(SETTINGS_FILENAME))
        .expect("Failed to copy settings.json");
}

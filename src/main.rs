//! Preview binary for the retro CRT effect.
//!
//! ```text
//! retrofx [PRESET.toml]
//! ```
//!
//! Without an argument the bundled `assets/presets/vhs.toml` is used when
//! present, otherwise the default (disabled) options.

use std::path::{Path, PathBuf};

use retrofx::options::Options;
use retrofx::Viewer;

const BUNDLED_PRESET: &str = "assets/presets/vhs.toml";

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    let preset = std::env::args_os().nth(1).map(PathBuf::from).or_else(|| {
        let bundled = Path::new(BUNDLED_PRESET);
        bundled.exists().then(|| bundled.to_path_buf())
    });

    if let Some(dir) = preset.as_deref().and_then(Path::parent) {
        let presets = Options::list_presets(dir);
        if !presets.is_empty() {
            log::info!("presets in {}: {}", dir.display(), presets.join(", "));
        }
    }

    let mut builder = Viewer::builder().with_title("retrofx");
    if let Some(path) = preset {
        log::info!("loading preset {}", path.display());
        builder = builder.with_preset(path);
    }

    if let Err(e) = builder.build().run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#![warn(clippy::pedantic)]

use anyhow::{Context, Result as AnyResult};
use darkroom::assets::{FileAssets, MockupLibrary};
use darkroom::global::Preferences;
use darkroom::renderer::{load_font, Renderer};
use darkroom_core::ingest::Upload;
use darkroom_core::state::EditorSession;

const USAGE: &str = "usage: darkroom <upload> [out.png]";

/// Place the upload at its default placement on the front of the garment, and write the print
/// file.
async fn export(upload: std::path::PathBuf, out: std::path::PathBuf) -> AnyResult<()> {
    let preferences = Preferences::get();
    if preferences.did_fail_to_load() {
        log::info!("Using default preferences");
    }
    let options = preferences.editor.clone();
    let font = match &options.font_path {
        Some(path) => Some(load_font(path).with_context(|| format!("loading {}", path.display()))?),
        None => None,
    };
    let mut renderer = Renderer::new(
        MockupLibrary::new(FileAssets::new(preferences.assets_dir())),
        font,
    );
    let mut session = EditorSession::new(options).context("unusable editor options")?;

    let bytes =
        std::fs::read(&upload).with_context(|| format!("reading {}", upload.display()))?;
    let name = upload.file_name().map_or_else(
        || upload.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    );
    let pending = darkroom::upload::begin(session.store(), Upload::from_bytes(name, bytes))
        .with_context(|| format!("{} can't be used", upload.display()))?;
    let decoded = pending
        .decode()
        .await
        .with_context(|| format!("decoding {}", upload.display()))?;
    decoded.place(session.store_mut(), None)?;

    let png = renderer.flatten(&session).await?;
    std::fs::write(&out, &png).with_context(|| format!("writing {}", out.display()))?;
    log::info!("Wrote {}", out.display());
    Ok(())
}

fn main() -> AnyResult<()> {
    let has_term = std::io::IsTerminal::is_terminal(&std::io::stdin());
    // Log to a terminal, if available. Else, log to "log.out" in the working directory.
    if has_term {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        let _ = simple_logging::log_to_file("log.out", log::LevelFilter::Debug);
    }

    // Paths are OSStrings, let the system handle character encoding restrictions.
    let mut args = std::env::args_os().skip(1).map(std::path::PathBuf::from);
    let upload = args.next().context(USAGE)?;
    let out = args.next().unwrap_or_else(|| upload.with_extension("print.png"));
    if args.next().is_some() {
        anyhow::bail!(USAGE);
    }

    if let Err(e) = Preferences::get().save() {
        log::warn!("Failed to save preferences:\n{e:?}");
    };

    // Upload and export are the only async work, and are interleaved on this thread.
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    runtime.block_on(export(upload, out))
}

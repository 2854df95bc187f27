//! Spritestage headless preview.
//!
//! Declares one sheet, spawns a sprite on it and prints the resolved view
//! frame by frame. Useful to check sheet options and modifiers without a
//! host surface.
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --sheet hero.png --options hero.json --state walk --frames 8
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::{error, info};

use spritestage::prelude::*;

const PREVIEW_MODIFIER: &str = "preview";

/// Spritestage sheet previewer
#[derive(Parser)]
#[command(version, about = "Headless preview of sprite sheet states and modifiers")]
struct Cli {
    /// Stage configuration file.
    #[arg(long, value_name = "PATH", default_value = "./stage.ini")]
    config: PathBuf,

    /// Write the effective configuration to the config path and exit.
    #[arg(long)]
    write_config: bool,

    /// Sheet image, relative to the asset root.
    #[arg(long, value_name = "LOCATOR")]
    sheet: Option<String>,

    /// JSON sheet options. Defaults come from the stage configuration.
    #[arg(long, value_name = "PATH")]
    options: Option<PathBuf>,

    /// State to preview.
    #[arg(long, default_value = "main")]
    state: String,

    /// 1-based tile for static states.
    #[arg(long, default_value_t = 1)]
    tile: u32,

    /// Playback rate multiplier.
    #[arg(long, default_value_t = 1.0)]
    rate: f32,

    /// Sprite scale.
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 10)]
    frames: u32,

    /// Simulated frames per second.
    #[arg(long, default_value_t = 60.0)]
    fps: f32,

    /// Scale the sprite to fit the configured viewport.
    #[arg(long)]
    fit: bool,

    /// Recolor saturated purple pixels and preview the derived image.
    #[arg(long)]
    recolor: bool,

    /// Write the derived image as PNG. Implies --recolor.
    #[arg(long, value_name = "PATH")]
    export_modifier: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), SpriteError> {
    let mut config = StageConfig::with_path(&cli.config);
    if cli.config.exists() {
        config.load_from_file()?;
    } else {
        info!("No config at {:?}, using defaults", cli.config);
    }

    if cli.write_config {
        config.save_to_file()?;
        println!("Configuration written to {}", cli.config.display());
        return Ok(());
    }

    let Some(locator) = cli.sheet.as_deref() else {
        return Err(SpriteError::Config(
            "nothing to preview, pass --sheet".to_string(),
        ));
    };

    let options = match &cli.options {
        Some(path) => SheetOptions::load_from_file(path)?,
        None => config.sheet_defaults(),
    };

    let source = Box::new(config.image_source());
    let mut stage = Stage::new(config, source);
    let (sheet, controls) = stage.declare(locator, options)?;

    let recolor = cli.recolor || cli.export_modifier.is_some();
    let mut sprite = sheet
        .sprite(&cli.state)?
        .with_tile(cli.tile)
        .with_rate(cli.rate)
        .with_scale(cli.scale);
    if recolor {
        controls.modifier(
            PREVIEW_MODIFIER,
            ThresholdRecolor::new([60, 80, 70])
                .above(Channel::Red, 110)
                .above(Channel::Blue, 200)
                .below(Channel::Green, 100),
        );
        sprite = sprite.with_modifier(PREVIEW_MODIFIER);
    }
    let entity = stage.spawn_sprite(sprite)?;
    if cli.fit {
        let viewport = stage.spawn_viewport();
        stage.world.entity_mut(entity).insert(ResizeTo::new(viewport));
    }
    // Lazy sheets start on reveal, delayed ones on load().
    stage.reveal(entity);
    controls.load().wait()?;

    let dt = 1.0 / cli.fps.max(1.0);
    for frame in 0..cli.frames {
        stage.tick(dt);
        if let Some(view) = stage.world.get::<SpriteView>(entity) {
            let f = &view.frame;
            println!(
                "frame {:>4}  {:>7.1}x{:<7.1} offset ({:>8.1}, {:>8.1})  {}",
                frame,
                f.width,
                f.height,
                f.offset_x,
                f.offset_y,
                describe(&f.content)
            );
        }
    }

    if let Some(path) = cli.export_modifier {
        let pipeline = controls.pipeline().clone();
        let mut waited = Duration::ZERO;
        while pipeline.get(PREVIEW_MODIFIER).is_none() && waited < Duration::from_secs(5) {
            std::thread::sleep(Duration::from_millis(10));
            waited += Duration::from_millis(10);
        }
        let derived = pipeline.get(PREVIEW_MODIFIER).ok_or_else(|| {
            SpriteError::Config("modifier did not finish in time".to_string())
        })?;
        std::fs::write(&path, &derived.encoded)?;
        println!("{} written to {}", derived.locator, path.display());
    }

    Ok(())
}

fn describe(content: &SpriteContent) -> String {
    match content {
        SpriteContent::Empty => "empty".to_string(),
        SpriteContent::Pending => "pending".to_string(),
        SpriteContent::Fallback(fallback) => format!("fallback '{}'", fallback.content),
        SpriteContent::Image(image) => image.locator().to_string(),
    }
}

/// OpenAlg Player: scene-script engine for ALG light-gun FMV games
///
/// Architecture:
///   script/   scene script grammar and scene graph
///   game/     behavior contract, session state, Mad Dog behaviors
///   engine/   frame scheduler, clocks, window/audio frontends
///   assets/   game directory discovery and scene offsets
mod assets;
mod engine;
mod game;
mod script;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use openalg_archive::LibArchive;
use openalg_common::AppConfig;
use openalg_media::{BlankDecoder, VideoDecoder};

use assets::{GameData, SceneLibrary};
use engine::clock::{Clock, ManualClock, SystemClock};
use engine::headless::HeadlessFrontend;
use engine::sound_engine::SoundEngine;
use engine::window::WindowFrontend;
use engine::{Frontend, Scheduler};
use game::hooks::HookTable;
use game::maddog::MadDog;
use game::save::SaveManager;
use game::{Behaviors, DebugOptions};
use script::SceneInfo;

#[derive(Parser)]
#[command(name = "openalg", version, about = "Scene-script engine for ALG light-gun games")]
struct Cli {
    /// Config file; defaults apply when it is missing
    #[arg(long, global = true, default_value = "openalg.toml")]
    config: PathBuf,

    /// Log behavior and hit detail
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play the game in GAME_DIR (or the configured data path)
    Play {
        game_dir: Option<PathBuf>,
        /// No window or audio; a manual clock drives pacing
        #[arg(long)]
        headless: bool,
        /// Outline active hit rects
        #[arg(long)]
        draw_rects: bool,
        /// Never lose a life
        #[arg(long)]
        god_mode: bool,
        /// Start from a canned game state
        #[arg(long)]
        warp: Option<u32>,
        /// Stop after this many loop iterations
        #[arg(long)]
        max_ticks: Option<u64>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        scale: Option<u32>,
    },
    /// Parse a scene script and resolve every behavior name
    Check { script: PathBuf },
    /// Print the scene graph
    Inspect {
        script: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// List the entries of a LIB archive
    Lib {
        libfile: PathBuf,
        /// Extract every entry into this directory
        #[arg(long)]
        dump: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    let level = if cli.verbose { "debug" } else { config.log_level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(format!("openalg={}", level).parse()?),
        )
        .init();

    tracing::info!("OpenAlg Player v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Command::Play {
            game_dir,
            headless,
            draw_rects,
            god_mode,
            warp,
            max_ticks,
            seed,
            scale,
        } => {
            let mut config = config;
            let game = &mut config.game;
            game.data_path = game_dir.or(game.data_path.take());
            game.seed = seed.or(game.seed);
            game.scale = scale.unwrap_or(game.scale);
            game.draw_rects |= draw_rects;
            game.god_mode |= god_mode;
            play(&config, headless, warp, max_ticks)
        }
        Command::Check { script } => check(&script),
        Command::Inspect { script, json } => inspect(&script, json),
        Command::Lib { libfile, dump } => lib(&libfile, dump.as_deref()),
    };
    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }
    result
}

fn play(
    config: &AppConfig,
    headless: bool,
    warp: Option<u32>,
    max_ticks: Option<u64>,
) -> Result<()> {
    let cfg = &config.game;
    let game_dir = match &cfg.data_path {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };

    let mut game = MadDog::new(cfg.seed);
    if let Some(skip) = cfg.frame_skip {
        game = game.with_frame_skip(skip);
    }
    let constants = *game.constants();

    let data = GameData::locate(&game_dir, cfg.game_id, constants.cue_files)?;
    let script = SceneInfo::load(&data.script_path)
        .with_context(|| format!("Failed to load {}", data.script_path.display()))?;
    let archive = LibArchive::open(&data.lib_path)
        .with_context(|| format!("Failed to open {}", data.lib_path.display()))?;
    let library = SceneLibrary::from_archive(&archive);
    tracing::info!(
        "{} scenes, {} zones, {} archive entries",
        script.scenes().len(),
        script.zones().len(),
        library.len()
    );

    let (w, h) = constants.video_size;
    let mut video = BlankDecoder::new(w, h);
    video.set_stream(Box::new(archive.into_inner()));
    tracing::info!("No video codec linked, scenes play as blank frames");

    let (frontend, clock): (Box<dyn Frontend>, Box<dyn Clock>) = if headless {
        (Box::new(HeadlessFrontend::new()), Box::new(ManualClock::new()))
    } else {
        let sound = SoundEngine::new(data.cues);
        let window = WindowFrontend::new(
            cfg.game_id.display_name(),
            constants.screen_size,
            cfg.scale,
            sound,
        )?;
        (Box::new(window), Box::new(SystemClock::new()))
    };

    let saves = SaveManager::new(&config.save_path, cfg.game_id.short_name());
    let mut scheduler = Scheduler::new(game, script, library, Box::new(video), frontend, clock)?
        .with_saves(saves)
        .with_debug(DebugOptions {
            draw_rects: cfg.draw_rects,
            god_mode: cfg.god_mode,
        });

    if let Some(slot) = warp {
        if !scheduler.warp(slot) {
            bail!("Unknown warp slot {}", slot);
        }
    }

    scheduler.run(max_ticks)?;
    tracing::info!(
        "Stopped at {} after {} ticks",
        scheduler.session().cur_scene,
        scheduler.ticks()
    );
    Ok(())
}

fn check(path: &Path) -> Result<()> {
    let script = SceneInfo::load(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    HookTable::<MadDog>::resolve(&script)?;
    println!(
        "{}: {} scenes, {} zones, start {}",
        path.display(),
        script.scenes().len(),
        script.zones().len(),
        script.start_scene()
    );
    Ok(())
}

fn inspect(path: &Path, json: bool) -> Result<()> {
    let script = SceneInfo::load(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&script)?);
        return Ok(());
    }

    println!("START {}", script.start_scene());
    for (i, scene) in script.scenes().iter().enumerate() {
        println!(
            "{:<12} {:>6}..={:<6} next {:<12} pre {} ins {} nxt {}",
            scene.name,
            scene.start_frame,
            scene.end_frame,
            scene.next,
            scene.pre_op.name,
            scene.ins_op.name,
            scene.next_scene_op
        );
        for zone in script.scene_zones(script::SceneId(i)) {
            println!(
                "    zone {:<12} {:>6}..={:<6} {} rects",
                zone.name,
                zone.start_frame,
                zone.end_frame,
                zone.rects.len()
            );
        }
    }
    Ok(())
}

fn lib(path: &Path, dump: Option<&Path>) -> Result<()> {
    let mut archive = LibArchive::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let entries: Vec<_> = archive.entries().cloned().collect();
    for entry in &entries {
        let size = archive.entry_size(&entry.name)?;
        println!("{:<13} {:#010x} {:>10}", entry.name, entry.offset, size);
    }
    println!("{} entries", entries.len());

    if let Some(dir) = dump {
        let count = archive.dump_all(dir)?;
        println!("Dumped {} entries to {}", count, dir.display());
    }
    Ok(())
}

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vista_assets::{FileLoader, ProgressLog};
use vista_frame::FixedRateSync;
use vista_render::{DebugTextRenderer, RenderBinding};
use vista_runtime::{RuntimeConfig, SceneRuntime, ScenePreset, ScheduledResize, run_headless};
use vista_tools::SceneInspector;

#[derive(Parser)]
#[command(name = "vista-cli", about = "Headless host for the vista scene runtime")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML runtime configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scene preset, overrides the configuration
    #[arg(short, long)]
    preset: Option<ScenePreset>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, presets and the effective configuration
    Info,
    /// Drive the frame loop headless and print each frame
    Run {
        /// Number of ticks to run
        #[arg(short, long, default_value = "10")]
        ticks: u64,
        /// Tick rate; 0 runs as fast as possible
        #[arg(long)]
        fps: Option<u32>,
        /// Resize before a tick, as WIDTHxHEIGHT@TICK (repeatable)
        #[arg(long = "resize")]
        resizes: Vec<ScheduledResize>,
        /// Directory that scene asset URIs resolve against
        #[arg(long, default_value = ".")]
        asset_root: PathBuf,
        /// Only print the final summary
        #[arg(short, long)]
        quiet: bool,
    },
    /// Print the scene graph and bindings of a preset
    Inspect {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<RuntimeConfig> {
    let mut config = RuntimeConfig::load_or_default(cli.config.as_deref())
        .context("loading runtime configuration")?
        .validated();
    if let Some(preset) = cli.preset {
        config.scene.preset = preset;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Info => {
            println!("vista-cli v{}", env!("CARGO_PKG_VERSION"));
            let presets: Vec<&str> = ScenePreset::ALL.iter().map(|p| p.name()).collect();
            println!("presets: {}", presets.join(", "));
            println!("preset: {}", config.scene.preset);
            println!(
                "viewport: {}x{} max density {}",
                config.window.width, config.window.height, config.render.max_pixel_density
            );
            println!("camera: {:?} {:?}", config.camera_mode(), config.camera.projection);
            println!("headless fps: {}", config.frame.headless_fps);
        }
        Commands::Run {
            ticks,
            fps,
            resizes,
            asset_root,
            quiet,
        } => {
            let mut runtime = SceneRuntime::from_config(&config)?;
            if !config.scene.assets.is_empty() {
                let loader = FileLoader::new(asset_root);
                let report = pollster::block_on(runtime.load_assets(
                    &loader,
                    &config.scene.assets,
                    &mut ProgressLog,
                ));
                println!(
                    "assets: {} loaded, {} failed",
                    report.loaded.len(),
                    report.failed.len()
                );
            }

            let mut render = RenderBinding::new(DebugTextRenderer::new(), config.render.max_pixel_density);
            let mut sync = FixedRateSync::new(fps.unwrap_or(config.frame.headless_fps));
            let completed = run_headless(&mut runtime, &mut render, &mut sync, ticks, &resizes, |rt, tick| {
                if quiet {
                    return;
                }
                let r = &tick.report;
                println!(
                    "frame {} dt={:.2}ms mutations={} rebuilds={} aspect={:.3}",
                    r.time.frame,
                    r.time.delta_secs() * 1000.0,
                    r.mutations.sets + r.mutations.commits,
                    r.rebuilds,
                    rt.camera().aspect()
                );
                match (&tick.output, &r.skipped) {
                    (Some(text), _) => println!("{text}"),
                    (None, Some(reason)) => println!("  skipped: {reason}"),
                    (None, None) => {}
                }
            })?;

            println!("completed {completed}/{ticks} ticks");
            println!("{}", SceneInspector::summary(&runtime));
            let released = runtime.teardown();
            tracing::info!(released, "scene released");
        }
        Commands::Inspect { json } => {
            let runtime = SceneRuntime::from_config(&config)?;
            let summary = SceneInspector::summary(&runtime);
            let nodes = SceneInspector::list_nodes(runtime.scene());
            let bindings = SceneInspector::bindings(runtime.bindings());
            if json {
                let doc = serde_json::json!({
                    "summary": summary,
                    "nodes": nodes,
                    "bindings": bindings,
                });
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                println!("{summary}");
                println!("\nNodes:");
                for node in &nodes {
                    println!("  {node}");
                }
                println!("\nBindings:");
                for binding in &bindings {
                    println!("  {binding}");
                }
            }
        }
    }

    Ok(())
}

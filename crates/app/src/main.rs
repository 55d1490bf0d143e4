use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use artshorts_core::{
    allocate_scenes, artwork_caption, load_narration, load_scene_descriptors, parse_artwork_info,
    AnalysisCache, AppConfig, Coordinator, ImageSize, JsonPlanSink, RenderSink, RhythmAnalyzer,
    SyncStrategy, Timeline,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn main() -> artshorts_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan(args) => run_plan(args),
        Commands::Timeline {
            analysis,
            min_interval,
            config,
        } => run_timeline(&analysis, min_interval, config.as_deref()),
        Commands::Distribute {
            analysis,
            scenes,
            strategy,
            config,
        } => run_distribute(&analysis, scenes, strategy, config.as_deref()),
        Commands::Precompute {
            input,
            output,
            target_duration,
        } => run_precompute(&input, &output, target_duration),
        Commands::Pace {
            scenes_file,
            config,
        } => run_pace(&scenes_file, config.as_deref()),
    }
}

fn run_plan(args: PlanArgs) -> artshorts_core::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(strategy) = args.strategy {
        config.audio.sync_strategy = strategy;
    }
    if args.no_sync {
        config.audio.enabled = false;
    }
    if let Some(info) = &args.artwork_info {
        config.showcase.caption = parse_artwork_info(info)?;
    } else if let Some(title) = &args.title {
        config.showcase.caption = artwork_caption(title, args.artist.as_deref());
    }

    let image = ImageSize::new(args.image_width, args.image_height);
    let scenes = load_scene_descriptors(&args.coordinates)?;
    tracing::info!(
        coordinates = %args.coordinates.display(),
        %image,
        scenes = scenes.len(),
        "planning render"
    );

    let cache = args.analysis.as_ref().map(AnalysisCache::new);
    let analyzer = cache.as_ref().map(|cache| cache as &dyn RhythmAnalyzer);

    let coordinator = Coordinator::new(config)?;
    let plan = coordinator.plan_with_analyzer(image, &scenes, analyzer)?;
    for diagnostic in &plan.diagnostics {
        tracing::warn!(%diagnostic, "planning diagnostic");
    }

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    let mut sink = JsonPlanSink::new(writer);
    sink.submit(&plan)?;

    tracing::info!(
        records = plan.records.len(),
        total_duration = plan.total_duration,
        "render plan written"
    );
    Ok(())
}

fn run_timeline(
    analysis: &Path,
    min_interval: Option<f64>,
    config: Option<&Path>,
) -> artshorts_core::Result<()> {
    let config = load_config(config)?;
    let analysis = AnalysisCache::new(analysis).analyze()?;
    let min_interval = min_interval.unwrap_or(config.audio.min_scene_interval);

    let timeline = Timeline::from_analysis(&analysis, min_interval)?;
    tracing::info!(anchors = timeline.len(), min_interval, "timeline built");
    print_json(&timeline)
}

fn run_distribute(
    analysis: &Path,
    scenes: usize,
    strategy: Option<SyncStrategy>,
    config: Option<&Path>,
) -> artshorts_core::Result<()> {
    let config = load_config(config)?;
    let analysis = AnalysisCache::new(analysis).analyze()?;
    let strategy = strategy.unwrap_or(config.audio.sync_strategy);

    let timeline = Timeline::from_analysis(&analysis, config.audio.min_scene_interval)?;
    let outcome = allocate_scenes(
        scenes,
        &timeline,
        &analysis,
        strategy,
        config.audio.min_scene_duration,
    )?;

    let report = serde_json::json!({
        "strategy": strategy,
        "degraded": outcome.degrade_reason(),
        "allocations": outcome.allocations(),
    });
    print_json(&report)
}

fn run_precompute(
    input: &Path,
    output: &Path,
    target_duration: Option<f64>,
) -> artshorts_core::Result<()> {
    tracing::info!(input = %input.display(), "importing audio analysis");
    let mut analysis = AnalysisCache::new(input).analyze()?.normalized();
    if let Some(target) = target_duration {
        analysis = analysis.truncated(target);
    }

    let cache = AnalysisCache::new(output);
    cache.store(&analysis)?;
    tracing::info!(
        path = %cache.path().display(),
        duration = analysis.duration,
        beats = analysis.beats.len(),
        onsets = analysis.onsets.len(),
        "analysis cache written"
    );
    Ok(())
}

fn run_pace(scenes_file: &Path, config: Option<&Path>) -> artshorts_core::Result<()> {
    let config = load_config(config)?;
    let pacing = config.video.pacing();
    let scenes = load_narration(scenes_file)?;

    let mut total = 0.0;
    let report: Vec<serde_json::Value> = scenes
        .iter()
        .enumerate()
        .map(|(index, text)| {
            let duration = pacing.duration_for(text);
            total += duration;
            serde_json::json!({ "scene": index + 1, "text": text, "duration": duration })
        })
        .collect();
    if config.showcase.enabled {
        total += config.video.final_scene_duration;
    }

    tracing::info!(scenes = scenes.len(), total_duration = total, "narration paced");
    print_json(&serde_json::json!({ "scenes": report, "total_duration": total }))
}

fn load_config(path: Option<&Path>) -> artshorts_core::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::default()),
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> artshorts_core::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Rhythm-synced zoom shorts from a single artwork", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the render plan for one artwork and write it as JSON.
    Plan(PlanArgs),
    /// Print the merged rhythm timeline of a cached audio analysis.
    Timeline {
        /// Audio analysis JSON produced by the beat/onset analyzer.
        #[arg(short, long)]
        analysis: PathBuf,
        /// Override the minimum spacing between anchors, in seconds.
        #[arg(long)]
        min_interval: Option<f64>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print how a number of scenes would be spread over an audio analysis.
    Distribute {
        #[arg(short, long)]
        analysis: PathBuf,
        /// Number of scenes to allocate.
        #[arg(short, long)]
        scenes: usize,
        #[arg(long)]
        strategy: Option<SyncStrategy>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate an analyzer's output and store it as a cleaned analysis cache.
    Precompute {
        /// Raw analysis JSON (`duration`, `tempo`, `beats`, `onsets`).
        #[arg(short, long)]
        input: PathBuf,
        /// Output path for the analysis cache.
        #[arg(short, long)]
        output: PathBuf,
        /// Keep only the first seconds of the audio.
        #[arg(long)]
        target_duration: Option<f64>,
    },
    /// Print how long each line of a narration script would be held.
    Pace {
        /// Narration script, one scene per non-blank line.
        #[arg(long)]
        scenes_file: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// Scene coordinates JSON (`[{scene, x, y, zoom, text}, ...]`).
    #[arg(long)]
    coordinates: PathBuf,
    /// Width of the source artwork in pixels.
    #[arg(long)]
    image_width: u32,
    /// Height of the source artwork in pixels.
    #[arg(long)]
    image_height: u32,
    /// Configuration JSON; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Cached audio analysis to synchronise scenes with.
    #[arg(short, long)]
    analysis: Option<PathBuf>,
    /// Override the configured sync strategy (auto, evenly, beats, onsets).
    #[arg(long)]
    strategy: Option<SyncStrategy>,
    /// Ignore the audio analysis and time scenes by narration length.
    #[arg(long)]
    no_sync: bool,
    /// Artwork title for the closing caption; underscores read as spaces.
    #[arg(long)]
    title: Option<String>,
    /// Artist line under the title.
    #[arg(long, requires = "title")]
    artist: Option<String>,
    /// Caption lines as a JSON array, replacing title and artist.
    #[arg(long, conflicts_with_all = ["title", "artist"])]
    artwork_info: Option<String>,
    /// Where to write the plan; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

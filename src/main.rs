mod cli;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use cli::{Cli, Commands, ConfigCmd, PostArgs};
use plotmerge::{
    init_logging, post_process, ConfigError, FileSink, FileSource, InkModeKind, JobKind,
    Settings, BUILD_DATE, VERSION,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    debug!("plotmerge {} (built {})", VERSION, BUILD_DATE);

    match cli.command {
        Commands::Post(args) => run_post(cli.config, args),
        Commands::Config(cmd) => run_config(cli.config, cmd.action),
    }
}

fn config_path(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => Ok(Settings::default_path()?),
    }
}

/// Explicit files must exist; the platform default may be absent
fn load_settings(explicit: Option<PathBuf>) -> anyhow::Result<Settings> {
    if let Some(path) = explicit {
        return Settings::load_from_file(&path)
            .with_context(|| format!("loading settings from {}", path.display()));
    }

    match Settings::default_path() {
        Ok(path) if path.exists() => Settings::load_from_file(&path)
            .with_context(|| format!("loading settings from {}", path.display())),
        _ => {
            debug!("No settings file, using defaults");
            Ok(Settings::default())
        }
    }
}

fn parse_mode(job: JobKind, mode: &str) -> Result<InkModeKind, ConfigError> {
    mode.parse().map_err(|_| ConfigError::UnknownInkMode {
        job: job.name().to_string(),
        mode: mode.to_string(),
    })
}

fn apply_overrides(settings: &mut Settings, args: &PostArgs) -> Result<(), ConfigError> {
    if let Some(z) = args.pen_up {
        settings.plotter.pen_up_z = z;
    }
    if let Some(z) = args.pen_down {
        settings.plotter.pen_down_z = z;
    }
    if let Some(feed) = args.feedrate {
        settings.gcode.default_feedrate = feed;
    }
    if let Some(token) = &args.marker {
        settings.gcode.marker.token = token.clone();
    }
    if let Some(mode) = &args.writing_mode {
        settings.gcode.writing.ink_mode = parse_mode(JobKind::Writing, mode)?;
    }
    if let Some(n) = args.writing_interval {
        settings.gcode.writing.stroke_interval = Some(n);
    }
    if let Some(mode) = &args.drawing_mode {
        settings.gcode.drawing.ink_mode = parse_mode(JobKind::Drawing, mode)?;
    }
    if let Some(n) = args.drawing_interval {
        settings.gcode.drawing.stroke_interval = Some(n);
    }
    Ok(())
}

fn run_post(config: Option<PathBuf>, args: PostArgs) -> anyhow::Result<()> {
    let mut settings = load_settings(config)?;
    apply_overrides(&mut settings, &args)?;

    let post = &settings.paths.post;
    let writing = args.writing.clone().unwrap_or_else(|| post.writing_input.clone());
    let drawing = args.drawing.clone().unwrap_or_else(|| post.drawing_input.clone());
    let output = args.output.clone().unwrap_or_else(|| post.merged_output.clone());

    let post_config = settings.build_post_config(
        Box::new(FileSource::new(&writing)),
        Box::new(FileSource::new(&drawing)),
    )?;
    let mut sink = FileSink::new(&output);
    let result = post_process(post_config, &mut sink)?;

    println!(
        "writing ink: {}, drawing ink: {}, paper changes: {}, lines: {}, output: {}",
        result.writing_ink(),
        result.drawing_ink(),
        result.paper_changes,
        result.total_lines,
        result.output
    );
    Ok(())
}

fn run_config(config: Option<PathBuf>, action: ConfigCmd) -> anyhow::Result<()> {
    match action {
        ConfigCmd::Init => {
            let path = config_path(config)?;
            let existed = path.exists();
            Settings::ensure_file(&path)?;
            if existed {
                println!("{} already exists", path.display());
            } else {
                println!("wrote {}", path.display());
            }
        }
        ConfigCmd::Show => {
            let settings = load_settings(config)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigCmd::Path => {
            println!("{}", config_path(config)?.display());
        }
    }
    Ok(())
}

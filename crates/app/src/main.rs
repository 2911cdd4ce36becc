use std::path::PathBuf;

use beatshift_core::{
    sidecar_path, wav, BeatshiftConfig, MapSetting, PartialConfig, Pipeline,
    ProgressEvent, TrimSetting,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> beatshift_core::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    init_tracing(config.debug);

    run(&config, cli.quiet)
}

/// Explicit flags override the config file, which overrides defaults.
fn resolve_config(cli: &Cli) -> beatshift_core::Result<BeatshiftConfig> {
    let file = match &cli.config {
        Some(path) => PartialConfig::load(path)?,
        None => PartialConfig::default(),
    };
    cli.overrides().or(file).resolve()
}

fn run(config: &BeatshiftConfig, quiet: bool) -> beatshift_core::Result<()> {
    tracing::info!(
        input = ?config.input,
        output = ?config.output,
        bpm = config.bpm,
        "beatshifting"
    );

    let settings = config.pipeline_settings()?;
    let audio = wav::read_file(&config.input)?;
    let pipeline = Pipeline::new(audio.format, settings)?;
    tracing::info!(
        beat_length = pipeline.beat_length(),
        block_align = audio.format.block_align,
        "segmenting beats"
    );

    let output = pipeline.run_with_progress(&audio.samples, |event| {
        if !quiet {
            print_progress(event);
        }
    })?;

    wav::write_file(&config.output, audio.spec, &output.samples)?;
    if let Some(log) = &output.shuffle_log {
        log.write_to(&sidecar_path(&config.output))?;
    }

    if !quiet {
        println!("Done");
    }
    Ok(())
}

fn print_progress(event: ProgressEvent) {
    match event {
        ProgressEvent::Trimmed { bytes } => println!("trimmed {bytes} bytes of silence"),
        ProgressEvent::Segment { index, start, end } => {
            println!("segment {index}: {start}..{end}")
        }
        ProgressEvent::Bar { index, total } => println!("bar {index}/{total}"),
        ProgressEvent::Start { .. } | ProgressEvent::Finish => {}
    }
}

fn init_tracing(debug: bool) {
    let fallback = if debug { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Rearrange the beats of a WAV file", long_about = None)]
struct Cli {
    /// File to beatshift [default: input.wav].
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Output file [default: output.wav].
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// The BPM of the input file [default: 120].
    #[arg(short, long)]
    bpm: Option<f64>,
    /// Number of beats per bar [default: 4].
    #[arg(long)]
    beats_per_bar: Option<u32>,
    /// How beats should be arranged, separated by commas. Leaving an entry
    /// blank removes it from the song [default: 1,4,3,2].
    #[arg(short, long, allow_hyphen_values = true)]
    map: Option<String>,
    /// Trim leading silence, optionally with a threshold in 0..=127
    /// [default threshold: 125].
    #[arg(short, long, num_args = 0..=1)]
    trim: Option<Option<u8>>,
    /// Shuffle the map before every bar and write a replay log.
    #[arg(short, long)]
    shuffle: bool,
    /// Seed for the shuffle.
    #[arg(long)]
    seed: Option<u64>,
    /// Print per-segment diagnostics.
    #[arg(short, long)]
    debug: bool,
    /// JSON config file; explicit flags take precedence over it.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Suppress progress output.
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn overrides(&self) -> PartialConfig {
        PartialConfig {
            input: self.input.clone(),
            output: self.output.clone(),
            bpm: self.bpm,
            beats_per_bar: self.beats_per_bar,
            map: self.map.clone().map(MapSetting::Text),
            trim: self.trim.map(|threshold| {
                threshold.map_or(TrimSetting::Enabled(true), TrimSetting::Threshold)
            }),
            shuffle: self.shuffle.then_some(true),
            seed: self.seed,
            debug: self.debug.then_some(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use beatshift_core::trim::DEFAULT_SILENCE_THRESHOLD;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn absent_flags_leave_fields_unset() {
        let cli = Cli::parse_from(["beatshift"]);
        assert_eq!(cli.overrides(), PartialConfig::default());
    }

    #[test]
    fn flags_override_file_values() {
        let cli = Cli::parse_from(["beatshift", "-b", "90", "-m", "4,3,2,1", "--trim"]);
        let file = PartialConfig::from_json(r#"{ "bpm": 140, "map": [1, 2], "shuffle": true }"#)
            .unwrap();

        let config = cli.overrides().or(file).resolve().unwrap();
        assert_eq!(config.bpm, 90.0);
        assert_eq!(config.map, vec![4, 3, 2, 1]);
        assert_eq!(config.trim, Some(DEFAULT_SILENCE_THRESHOLD));
        assert!(config.shuffle);
    }

    #[test]
    fn trim_accepts_explicit_threshold() {
        let cli = Cli::parse_from(["beatshift", "--trim", "100"]);
        assert_eq!(cli.trim, Some(Some(100)));
        assert_eq!(cli.overrides().trim, Some(TrimSetting::Threshold(100)));
    }

    #[test]
    fn bare_trim_uses_the_library_threshold() {
        let cli = Cli::parse_from(["beatshift", "--trim"]);
        assert_eq!(cli.trim, Some(None));

        let config = cli.overrides().resolve().unwrap();
        assert_eq!(config.trim, Some(DEFAULT_SILENCE_THRESHOLD));
    }
}

//! wavetrak CLI: inspect song documents and run headless playback.
//!
//! ```bash
//! wavetrak info song.wtk
//! wavetrak dump song.wtk --pattern 1
//! wavetrak play song.wtk --rows 32
//! wavetrak play song.wtk --realtime
//! wavetrak new blank.wtk --title "Sketch" --channels 8
//! ```
//!
//! Playback has no synthesizer attached; note events are reported through
//! the log (`-v` or `RUST_LOG=info`).

mod cell_format;

use std::cell::Cell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wt_engine::{Clock, ManualClock, PositionListener};
use wt_ir::Song;
use wt_master::{Controller, SystemClock, TraceBackend};

#[derive(Parser)]
#[command(name = "wavetrak")]
#[command(about = "Tracker song inspector and headless player")]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print song header, instruments and order list
    Info(InfoArgs),

    /// Print pattern contents in tracker notation
    Dump(DumpArgs),

    /// Run the sequencer over a song
    Play(PlayArgs),

    /// Write an empty default song
    New(NewArgs),
}

#[derive(Args)]
struct InfoArgs {
    file: PathBuf,
}

#[derive(Args)]
struct DumpArgs {
    file: PathBuf,

    /// Only this pattern
    #[arg(short, long)]
    pattern: Option<u8>,
}

#[derive(Args)]
struct PlayArgs {
    file: PathBuf,

    /// Stop after this many rows
    #[arg(long)]
    rows: Option<u64>,

    /// Stop after this many seconds (default: one pass through the order list)
    #[arg(long)]
    seconds: Option<f64>,

    /// Follow the wall clock instead of simulating time
    #[arg(long)]
    realtime: bool,
}

#[derive(Args)]
struct NewArgs {
    out: PathBuf,

    #[arg(long, default_value = "Untitled")]
    title: String,

    #[arg(long, default_value = "Unknown")]
    author: String,

    #[arg(long, default_value_t = wt_ir::DEFAULT_CHANNELS)]
    channels: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Info(args) => info(args),
        Commands::Dump(args) => dump(args),
        Commands::Play(args) => play(args),
        Commands::New(args) => new_song(args),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn read_song(path: &Path) -> Result<Song> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    wt_formats::load_song(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

fn info(args: InfoArgs) -> Result<()> {
    let song = read_song(&args.file)?;
    println!("Title:    {}", song.title);
    println!("Author:   {}", song.author);
    println!("Tempo:    {} BPM, Speed: {}", song.bpm(), song.speed());
    println!("Channels: {}", song.channels());
    println!("Patterns: {}", song.patterns().len());
    let order: Vec<String> = song.order().iter().map(|p| format!("{:02X}", p)).collect();
    println!("Order:    {}", order.join(" "));
    println!("Length:   {:.2}s", song.duration_secs());
    println!();
    println!("Instruments:");
    for (i, inst) in song.instruments().iter().enumerate() {
        println!("  {:02X} {:<20} {}", i, inst.name, inst.waveform.name());
    }
    Ok(())
}

fn dump(args: DumpArgs) -> Result<()> {
    let song = read_song(&args.file)?;
    let indices: Vec<u8> = match args.pattern {
        Some(p) if song.pattern(p).is_none() => bail!("No pattern {:02X}", p),
        Some(p) => vec![p],
        None => (0..song.patterns().len()).map(|i| i as u8).collect(),
    };

    for index in indices {
        let Some(pattern) = song.pattern(index) else {
            continue;
        };
        println!("Pattern {:02X} ({} rows)", index, pattern.rows());
        for (row, cells) in pattern.iter_rows().enumerate() {
            let line: Vec<String> = cells.iter().map(cell_format::format_cell).collect();
            println!("{:02X} | {}", row, line.join(" | "));
        }
        println!();
    }
    Ok(())
}

/// Counts row notifications.
struct RowCounter(Rc<Cell<u64>>);

impl PositionListener for RowCounter {
    fn on_row_change(&mut self, _row: u16) {
        self.0.set(self.0.get() + 1);
    }
}

fn play(args: PlayArgs) -> Result<()> {
    let song = read_song(&args.file)?;
    let seconds = args.seconds.unwrap_or_else(|| song.duration_secs());
    let limit_ms = seconds * 1000.0;
    println!("Playing \"{}\" by {}", song.title, song.author);

    let rows = Rc::new(Cell::new(0u64));
    let sim_clock = ManualClock::new(0.0);
    let mut ctl = if args.realtime {
        Controller::with_clock(song, TraceBackend::new(), SystemClock::new())
    } else {
        Controller::with_clock(song, TraceBackend::new(), sim_clock.clone())
    };
    ctl.set_listener(Some(Box::new(RowCounter(rows.clone()))));

    let wall = SystemClock::new();
    let elapsed = || {
        if args.realtime {
            wall.now_ms()
        } else {
            sim_clock.now()
        }
    };

    ctl.play();
    while elapsed() < limit_ms && !row_limit_reached(&rows, args.rows) {
        if args.realtime {
            std::thread::sleep(Duration::from_millis(1));
            ctl.poll();
        } else {
            // Simulated time: step ticks directly, the clock only tracks elapsed time.
            sim_clock.advance(ctl.tick_interval_ms());
            ctl.sequencer_mut().tick();
        }
        print_position(&ctl);
    }

    let played = rows.get();
    ctl.stop();
    let audio = ctl.audio();
    println!(
        "\rDone. {} rows, {} notes, {} channel updates",
        played, audio.notes_played, audio.updates
    );
    Ok(())
}

fn row_limit_reached(rows: &Rc<Cell<u64>>, limit: Option<u64>) -> bool {
    limit.is_some_and(|n| rows.get() >= n)
}

fn print_position(ctl: &Controller<TraceBackend>) {
    let pos = ctl.position();
    let pattern = pos.pattern.map_or("--".to_string(), |p| format!("{:02X}", p));
    print!("\rOrd: {:02X} | Pat: {} | Row: {:02X}", pos.order, pattern, pos.row);
    let _ = std::io::stdout().flush();
}

fn new_song(args: NewArgs) -> Result<()> {
    if args.channels == 0 || args.channels > wt_ir::MAX_CHANNELS {
        bail!("Channel count must be 1-{}", wt_ir::MAX_CHANNELS);
    }
    let song = Song::with_channels(&args.title, &args.author, args.channels);
    let json = wt_formats::save_song(&song)?;
    fs::write(&args.out, json).with_context(|| format!("Failed to write {}", args.out.display()))?;
    println!("Wrote {}", args.out.display());
    Ok(())
}

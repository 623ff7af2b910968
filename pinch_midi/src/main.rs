//! pinch_midi — interactive entry point.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use gesture_cc::MappingConfig;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pinch_midi::{
    app,
    config::Config,
    error::ConfigError,
    Endpoint, MidiTransport, MidirBackend, Session, SourceKind,
};

/// Pinch your thumb and index finger to play a MIDI Control Change
#[derive(Parser, Debug)]
#[command(name = "pinch_midi", version, about, long_about = None)]
struct Args {
    /// Configuration file path (default: ./pinch_midi.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// MIDI channel 1-16 (overrides config)
    #[arg(long)]
    channel: Option<u8>,

    /// Controller number 0-127 (overrides config)
    #[arg(long)]
    cc: Option<u8>,

    /// Distance that maps to 0 (overrides config)
    #[arg(long)]
    min: Option<f32>,

    /// Distance that maps to 127 (overrides config)
    #[arg(long)]
    max: Option<f32>,

    /// MIDI output: endpoint id or name fragment (overrides config)
    #[arg(short, long)]
    port: Option<String>,

    /// Where hand landmarks come from (overrides config)
    #[arg(short, long, value_enum)]
    source: Option<SourceKind>,

    /// List MIDI outputs and exit
    #[arg(long)]
    list_ports: bool,

    /// Run without the meter window
    #[arg(long)]
    headless: bool,

    /// Use the first MIDI output without asking
    #[arg(short, long)]
    quick: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", pinch_midi::NAME, pinch_midi::VERSION);

    let cfg = load_config(&args)?;

    let transport = MidiTransport::new(Box::new(MidirBackend::new(&cfg.midi.client_name)));
    let mut session = Session::new(cfg.mapping, cfg.smoothing, transport);

    // Handle list-ports mode
    if args.list_ports {
        let endpoints = session.scan()?;
        if endpoints.is_empty() {
            println!("No MIDI outputs found.");
        }
        for (i, ep) in endpoints.iter().enumerate() {
            println!("  {}. {}", i + 1, ep.name);
        }
        return Ok(());
    }

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Pinch MIDI — thumb/index distance → MIDI CC         ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!(
        "  Channel {}  CC {}  window {:.3}..{:.3}",
        cfg.mapping.channel(), cfg.mapping.cc_number(),
        cfg.mapping.min_distance(), cfg.mapping.max_distance(),
    );
    println!();

    bind_output(&mut session, &args, &cfg);

    app::run(&mut session, &cfg, args.headless)?;

    info!("{} stopped", pinch_midi::NAME);
    Ok(())
}

/// Config file, then command-line overrides, then validation.
fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut cfg = match &args.config {
        Some(path) => Config::from_file(path)?,
        None       => Config::load()?,
    };

    let m = cfg.mapping;
    cfg.mapping = MappingConfig::new(
        args.channel.unwrap_or(m.channel()),
        args.cc.unwrap_or(m.cc_number()),
        args.min.unwrap_or(m.min_distance()),
        args.max.unwrap_or(m.max_distance()),
    )
    .map_err(ConfigError::from)?;

    if let Some(port) = &args.port {
        cfg.midi.port = Some(port.clone());
    }
    if let Some(kind) = args.source {
        cfg.source.kind = kind;
    }

    cfg.validate()?;
    Ok(cfg)
}

/// Scan, pick an output, connect.  Failures leave the session unbound with
/// the reason in its status; the meter can rescan later.
fn bind_output(session: &mut Session, args: &Args, cfg: &Config) {
    let endpoints = match session.scan() {
        Ok(list) => list,
        Err(_) => {
            println!("  {}", session.status());
            return;
        }
    };

    if endpoints.is_empty() {
        println!("  {}", session.status());
        return;
    }

    let picked = if let Some(wanted) = &cfg.midi.port {
        session.select_matching(wanted)
    } else if args.quick || endpoints.len() == 1 || cfg.source.kind == SourceKind::Stdin {
        // stdin carries landmark packets, so it cannot answer a prompt
        session.select_index(0)
    } else {
        match pick_endpoint(&endpoints) {
            Some(i) => session.select_index(i),
            None    => {
                println!("  No output selected; press C in the meter after a rescan.");
                return;
            }
        }
    };

    if picked.is_err() || session.connect().is_err() {
        warn!("MIDI output not bound: {}", session.status());
    }
    println!("  {}", session.status());
    println!();
}

fn pick_endpoint(endpoints: &[Endpoint]) -> Option<usize> {
    println!("  MIDI outputs:");
    for (i, ep) in endpoints.iter().enumerate() {
        println!("    {}. {}", i + 1, ep.name);
    }
    loop {
        let line = read_line(&format!("  Output (1–{}, default 1, n = none): ", endpoints.len()));
        match line.trim() {
            ""          => return Some(0),
            "n" | "N"   => return None,
            s => match s.parse::<usize>() {
                Ok(n) if (1..=endpoints.len()).contains(&n) => return Some(n - 1),
                _ => println!("    ⚠  1–{} only.", endpoints.len()),
            },
        }
    }
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}

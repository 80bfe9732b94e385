use std::fmt::Debug;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::error;

use plotturtle::{Config, Mode, PlanarTurtle, Session, SpatialTurtle, Turtle};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("PLOTTURTLE_GIT_HASH"),
    ", ",
    env!("PLOTTURTLE_GIT_DIRTY"),
    ", built ",
    env!("PLOTTURTLE_BUILD_UNIX"),
    ")"
);

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Text,
}

#[derive(Parser)]
#[command(name = "plotturtle")]
#[command(version = VERSION)]
#[command(about = "Run a turtle program and print where the pen went")]
struct Cli {
    /// Path to a turtle program
    file: Option<String>,
    /// Use the 3-axis turtle (up/down/roll_cw/roll_ccw)
    #[arg(long = "3d")]
    spatial: bool,
    /// Distance covered by one animation increment of `forward`
    #[arg(long, default_value_t = plotturtle::config::DEFAULT_STEP_SIZE)]
    step_size: f64,
    /// Give up after this many steps
    #[arg(long, default_value_t = plotturtle::config::DEFAULT_MAX_STEPS)]
    max_steps: u64,
    /// Output format for the final pose and path
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
    /// Report failing commands and carry on instead of stopping
    #[arg(long)]
    keep_going: bool,
    /// Log every executed command (overrides RUST_LOG)
    #[arg(long)]
    debug: bool,
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

#[derive(Serialize)]
struct Report<'a, T: Serialize> {
    mode: Mode,
    ticks: u64,
    errors: usize,
    variables: Vec<(String, i64)>,
    turtle: &'a T,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let Some(file) = cli.file.as_deref() else {
        println!("plotturtle - run a turtle program, e.g.: plotturtle demos/square.turtle");
        return Ok(());
    };
    let config = Config {
        step_size: cli.step_size,
        max_steps: cli.max_steps,
        mode: if cli.spatial { Mode::Spatial } else { Mode::Planar },
    };

    match config.mode {
        Mode::Planar => {
            let session = Session::new(PlanarTurtle::new(), &config)?;
            run(session, file, &config, &cli)
        }
        Mode::Spatial => {
            let session = Session::new(SpatialTurtle::new(), &config)?;
            run(session, file, &config, &cli)
        }
    }
}

fn run<T>(mut session: Session<T>, file: &str, config: &Config, cli: &Cli) -> anyhow::Result<()>
where
    T: Turtle + Serialize,
    T::Point: Debug,
{
    session
        .load_file(file)
        .with_context(|| format!("loading {}", file))?;

    let mut errors = 0usize;
    let mut failed_at = 0u64;
    session
        .run_to_end(config.max_steps, |tick, e| {
            if cli.keep_going {
                error!("step {}: {}", tick, e);
                errors += 1;
                Ok(())
            } else {
                failed_at = tick;
                Err(e)
            }
        })
        .with_context(|| match failed_at {
            0 => format!("running {}", file),
            tick => format!("step {} of {}", tick, file),
        })?;

    let turtle = session.turtle();
    match cli.format {
        Format::Json => {
            let report = Report {
                mode: config.mode,
                ticks: session.ticks(),
                errors,
                variables: session.interpreter().env().list(),
                turtle,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Format::Text => {
            let path = turtle.path();
            println!("position: {:?}", turtle.position());
            println!("pen: {}", if turtle.is_pen_down() { "down" } else { "up" });
            println!(
                "path: {} entries, {} strokes, {} breaks",
                path.len(),
                path.strokes().len(),
                path.break_count()
            );
            println!("ticks: {}", session.ticks());
            for (name, value) in session.interpreter().env().list() {
                println!("{} = {}", name, value);
            }
            if errors > 0 {
                println!("errors: {}", errors);
            }
        }
    }
    Ok(())
}

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tools::{Scene, Simulation};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless panorama stage simulator")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scene and print one JSON report per frame
    Simulate {
        /// Scene description (JSON)
        scene: PathBuf,

        /// Number of frames to run
        #[arg(long, default_value_t = 60)]
        frames: u64,

        /// Seconds per frame
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f64,
    },

    /// Print the tiles visible from the scene's initial view
    Tiles {
        /// Scene description (JSON)
        scene: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match args.command {
        Command::Simulate { scene, frames, dt } => {
            let scene = Scene::load(&scene)?;
            let mut sim = Simulation::new(&scene)?;
            for line in sim.run(frames, dt)? {
                writeln!(out, "{}", serde_json::to_string(&line)?)?;
            }
        }
        Command::Tiles { scene } => {
            let scene = Scene::load(&scene)?;
            let mut sim = Simulation::new(&scene)?;
            for tile in sim.initial_tiles() {
                writeln!(out, "{tile}")?;
            }
        }
    }
    Ok(())
}

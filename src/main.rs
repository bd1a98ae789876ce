use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};

pub mod engine;
pub mod error;
pub mod io;
pub mod model;
pub mod pipeline;
pub mod utils;

use error::Result;
use pipeline::{extract_frame, GenerationParameters, GenerationPipeline};

#[derive(Parser)]
#[command(name = "strucgen")]
#[command(about = "Generate strained and rattled crystal structures for training data", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stride through a trajectory and write perturbed POSCAR variants
    Generate {
        /// Input XDATCAR, POSCAR, CONTCAR, or extended-XYZ file
        #[arg(short, long)]
        input: PathBuf,

        /// Maximum random strain on the lattice vectors, in [0, 1]
        #[arg(long, default_value_t = 0.05)]
        max_strain: f64,

        /// Maximum random displacement amplitude in Angstroms, in [0, 1]
        #[arg(long, default_value_t = 0.1)]
        max_amplitude: f64,

        /// Starting id for generated structures
        #[arg(long, default_value_t = 1)]
        start_id: u64,

        /// Directory for the generated POSCAR files
        #[arg(short, long, default_value = "./poscars_db")]
        output_dir: PathBuf,

        /// Number of rattled copies per selected structure
        #[arg(long, default_value_t = 1)]
        rattle_count: u32,

        /// Interval for selecting structures from the input sequence
        #[arg(long, default_value_t = 1)]
        stride: usize,

        /// Also write the deformed-but-unrattled structure when
        /// rattle-count is 0
        #[arg(long, action = ArgAction::SetTrue)]
        write_deformed: bool,
    },
    /// Extract one frame of a trajectory as a POSCAR file
    Extract {
        /// Input trajectory (XDATCAR or extended-XYZ)
        trajectory: PathBuf,

        /// Zero-based frame index
        index: usize,

        /// Output path (defaults to POSCAR-<index>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Generate {
            input,
            max_strain,
            max_amplitude,
            start_id,
            output_dir,
            rattle_count,
            stride,
            write_deformed,
        } => {
            let params = GenerationParameters {
                max_strain,
                max_amplitude,
                start_id,
                rattle_count,
                stride,
                output_dir,
                write_deformed,
            };
            let written = GenerationPipeline::new(input, params)?.run()?;
            println!("Processing completed successfully: {written} structure(s) written.");
        }
        Command::Extract {
            trajectory,
            index,
            output,
        } => {
            let output = output.unwrap_or_else(|| PathBuf::from(format!("POSCAR-{index}")));
            extract_frame(&trajectory, index, &output)?;
            println!("Wrote {}", output.display());
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    if let Err(e) = run(cli.command) {
        eprintln!("An error occurred during processing: {e}");
        process::exit(1);
    }
}

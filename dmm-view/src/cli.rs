//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// dmmview -- decode UT61E+ multimeter telemetry from the command line
#[derive(Parser, Debug)]
#[command(name = "dmmview", version, about)]
pub struct Cli {
    /// Meter variant (e.g. UT61E+, UT61D+). Selects the calibration table.
    #[arg(long, global = true)]
    pub variant: Option<String>,

    /// Directory of calibration documents, searched before the built-in ones
    #[arg(long, global = true)]
    pub calibration_dir: Option<PathBuf>,

    /// Print a byte-by-byte breakdown of each frame
    #[arg(long, global = true)]
    pub annotate: bool,

    /// Print one JSON object per frame
    #[arg(long, global = true, conflicts_with = "annotate")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode frames given as hex (e.g. "AB CD 10 01 30 ...")
    Decode {
        /// One frame per argument
        #[arg(required = true)]
        frames: Vec<String>,
    },

    /// Decode hex frames read from stdin, one per line
    Watch,

    /// Run a virtual meter and decode the frames it streams
    Simulate {
        /// Stop after this many measurement frames
        #[arg(long)]
        count: Option<usize>,

        /// Interval between frames in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Function to start in, by its table name (e.g. DCV, OHM, Hz)
        #[arg(long)]
        function: Option<String>,

        /// LCD text to show
        #[arg(long)]
        reading: Option<String>,

        /// Buttons to press before streaming (e.g. hold, rel, min_max)
        #[arg(long = "press")]
        presses: Vec<String>,
    },

    /// Print the wire encoding of a device command, or list all commands
    Command {
        /// Command name (e.g. hold, send_data, get_name)
        name: Option<String>,
    },

    /// Show the effective settings
    Config {
        /// Write the effective settings to the settings file
        #[arg(long)]
        save: bool,
    },
}

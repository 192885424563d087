//! Command line interface.

pub mod command;

use std::{path::PathBuf, time::Duration};

use chrono::NaiveDate;
use clap::{command, Args, Parser, Subcommand};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::regions::Region;

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct DataOpts {
    /// ERDDAP griddap server
    #[arg(long, default_value = crate::erddap::SERVER)]
    pub server: String,

    /// Directory for CSV output (defaults to the home directory)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute the daily extent series per region from the CDR product
    Extent {
        /// First day of the series (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last day of the series (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,

        /// Restrict to a single region
        #[arg(long, value_enum)]
        region: Option<Region>,

        #[command(flatten)]
        opts: DataOpts,
    },
    /// Compute ice-year (September to August) mean extent per region
    Annual {
        /// First ice year
        #[arg(long)]
        start_year: i32,

        /// Last ice year
        #[arg(long)]
        end_year: i32,

        #[command(flatten)]
        opts: DataOpts,
    },
    /// Compute month/day extent climatology over a baseline period
    Baseline {
        /// First year of the baseline period
        #[arg(long)]
        start_year: i32,

        /// Last year of the baseline period
        #[arg(long)]
        end_year: i32,

        /// Restrict to a single region
        #[arg(long, value_enum)]
        region: Option<Region>,

        #[command(flatten)]
        opts: DataOpts,
    },
    /// Append days after the last recorded date from the NRT product
    Update {
        #[command(flatten)]
        opts: DataOpts,
    },
    /// Report the total valid ocean area per region
    Area {
        #[command(flatten)]
        opts: DataOpts,
    },
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a spinner attached to a shared draw target, so bars ticking from
/// concurrent tasks do not interleave on the terminal.
pub fn create_multi_spinner(progress: &MultiProgress, message: String) -> ProgressBar {
    let bar = progress.add(ProgressBar::new_spinner().with_message(message));
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> ProgressBar {
    ProgressBar::new(size).with_message(message).with_style(
        ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {msg}")
            .unwrap()
            .progress_chars("##-"),
    )
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_attach_spinners_to_shared_draw_target() {
        let progress = MultiProgress::new();

        let first = create_multi_spinner(&progress, "first".to_string());
        let second = create_multi_spinner(&progress, "second".to_string());

        assert_eq!(first.message(), "first");
        assert_eq!(second.message(), "second");
        first.finish_with_message("done");
        assert_eq!(first.message(), "done");
    }
}

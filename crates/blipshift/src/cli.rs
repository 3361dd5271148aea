//! Command line entry points.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::app::combine;
use crate::app::discovery::{self, DiscoveryConfig, SourceFile};
use crate::app::extract::ExtractionRules;
use crate::app::materialize;
use crate::app::workspace::WorkingSet;
use crate::domain::model::CoordinateRecord;
use crate::infra::config::Config;
use crate::ui::input;
use crate::ui::menu::{self, Menu};
use crate::ui::prompt::group_by_file;
use crate::ui::terminal::TerminalPrompter;

#[derive(Debug, Parser)]
#[command(author, version, about = "Shift blip coordinates across XML files", long_about = None)]
pub struct Cli {
    /// Directory holding the source files (overrides configuration)
    #[arg(long, global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the interactive menu (default)
    Menu,
    /// Print the blips found in the given files, or in every file of the directory
    List {
        files: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Compute the offset moving one blip onto a reference point
    Offset {
        #[arg(long)]
        file: String,
        /// 1-based position of the blip within the file
        #[arg(long)]
        record: usize,
        /// Reference point as "x, y, z"
        #[arg(long, allow_hyphen_values = true)]
        reference: String,
    },
    /// Shift every blip of the given files and save suffixed copies
    Apply {
        /// Offset as "dx dy dz"
        #[arg(long, allow_hyphen_values = true)]
        offset: String,
        files: Vec<String>,
    },
    /// Replace originals with their fixed versions
    Replace,
    /// Combine files into a new file in the source directory
    Combine {
        #[arg(long)]
        output: String,
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Print shell completions
    Completions { shell: Shell },
}

pub fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(dir) = cli.dir {
        config.workspace.directory = dir;
    }
    let discovery = DiscoveryConfig::from_config(&config);
    let rules = ExtractionRules::from_config(&config);
    let precision = config.display.precision;
    let suffix = config.workspace.fixed_suffix.clone();

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Menu => {
            let mut menu = Menu::new(TerminalPrompter::new(precision), config);
            menu.run()
        }
        Commands::List { files, json } => {
            let sources = resolve_sources(&discovery, &suffix, &files)?;
            let set = WorkingSet::load(&sources, rules)?;
            if json {
                let rendered = serde_json::to_string_pretty(set.records())
                    .context("failed to serialize records")?;
                println!("{rendered}");
            } else {
                print_records(set.records(), precision);
            }
            Ok(())
        }
        Commands::Offset {
            file,
            record,
            reference,
        } => {
            let reference = input::parse_reference_point(&reference)?;
            let sources = resolve_sources(&discovery, &suffix, &[file])?;
            let set = WorkingSet::load(&sources, rules)?;
            let index = record
                .checked_sub(1)
                .filter(|index| *index < set.records().len())
                .with_context(|| {
                    format!(
                        "record {record} out of range (file has {} blips)",
                        set.records().len()
                    )
                })?;
            let offset = set.compute_offset(index, reference)?;
            println!(
                "Blip {} - Offset: {}, Distance={:.p$}",
                set.records()[index].name,
                menu::components(offset.delta, precision),
                offset.distance,
                p = precision
            );
            Ok(())
        }
        Commands::Apply { offset, files } => {
            let delta = input::parse_offset_vector(&offset)?;
            let sources = resolve_sources(&discovery, &suffix, &files)?;
            let mut set = WorkingSet::load(&sources, rules)?;
            let selection: Vec<usize> = (0..set.records().len()).collect();
            set.apply_offset(&selection, delta)?;
            for path in set.save_modified(&suffix)? {
                println!("Modified file saved as {}", path.display());
            }
            Ok(())
        }
        Commands::Replace => {
            let report = materialize::replace_with_fixed(&discovery, &suffix)?;
            for outcome in &report.outcomes {
                println!("{outcome}");
            }
            if report.failed() > 0 {
                bail!("{} file(s) could not be replaced", report.failed());
            }
            Ok(())
        }
        Commands::Combine { output, files } => {
            let sources = resolve_sources(&discovery, &suffix, &files)?;
            let name = materialize::normalize_output_name(&output, &config.workspace.extension);
            let output = discovery.directory.join(name);
            let summary =
                combine::combine_files(&sources, &rules, &config.combine.root_element, &output)?;
            println!("Combined XML saved to {}", summary.output.display());
            Ok(())
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "blipshift", &mut io::stdout());
            Ok(())
        }
    }
}

/// Named files relative to the source directory, or every discovered file when none are named.
/// Discovered files exclude earlier `suffix` outputs.
fn resolve_sources(
    discovery: &DiscoveryConfig,
    suffix: &str,
    files: &[String],
) -> Result<Vec<SourceFile>> {
    if files.is_empty() {
        let mut discovered = discovery::discover(discovery)?;
        discovered.retain(|file| !materialize::is_fixed_variant(&file.path, suffix));
        return Ok(discovered);
    }

    files
        .iter()
        .map(|name| {
            let path = discovery.directory.join(name);
            if !path.is_file() {
                bail!("no such file: {}", path.display());
            }
            Ok(SourceFile::from_path(path))
        })
        .collect()
}

fn print_records(records: &[CoordinateRecord], precision: usize) {
    for (file, indices) in group_by_file(records) {
        println!("--- {file} ---");
        for (position, index) in indices.into_iter().enumerate() {
            println!("  {}) {}", position + 1, records[index].label(precision));
        }
    }
}

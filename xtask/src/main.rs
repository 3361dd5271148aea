use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cargo nextest with default configuration
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        release: bool,
    },
    /// Write a directory of blip files for trying the tool by hand
    SampleData {
        #[arg(long, default_value = "target/sample-blips")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Nextest { profile, release } => run_nextest(profile, release)?,
        Commands::SampleData { out } => write_sample_data(&out)?,
    }
    Ok(())
}

fn run_nextest(profile: Option<String>, release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("nextest").arg("run");
    if let Some(profile) = profile {
        cmd.arg("--profile").arg(profile);
    }
    if release {
        cmd.arg("--release");
    }
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("cargo nextest run failed");
    }
    Ok(())
}

const SAMPLES: &[(&str, &str, &[(&str, [f64; 3])])] = &[
    (
        "deaddrops.xml",
        "DeadDrops",
        &[
            ("Docks", [7554.967, -285.6804, 6.080537]),
            ("Airfield", [-1120.25, 3305.5, 41.0]),
            ("CameraPosition", [7560.0, -280.0, 12.0]),
        ],
    ),
    (
        "scrapyards.xml",
        "ScrapYards",
        &[
            ("Quarry", [2710.4, 2874.125, 44.75]),
            ("Harbor", [1005.0, -3190.5, 5.25]),
        ],
    ),
];

fn write_sample_data(out: &Path) -> Result<()> {
    fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;
    for (file, root, blips) in SAMPLES {
        let mut xml = format!("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<{root}>\n");
        for (name, [x, y, z]) in blips.iter() {
            xml.push_str(&format!(
                "  <Blip>\n    <Name>{name}</Name>\n    <X>{x}</X>\n    <Y>{y}</Y>\n    <Z>{z}</Z>\n  </Blip>\n"
            ));
        }
        xml.push_str(&format!("</{root}>\n"));

        let path = out.join(file);
        fs::write(&path, xml).with_context(|| format!("failed to write {}", path.display()))?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = blipshift::cli::Cli::parse();
    blipshift::init(cli.verbose);
    blipshift::cli::run(cli)
}

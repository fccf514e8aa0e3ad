use anyhow::Result;
use clap::{Arg, Command};

use sysdash::commands;

fn main() -> Result<()> {
    let matches = Command::new("sysdash")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Live CPU, GPU, memory, disk and network dashboard")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("monitor")
                .about("Real-time system dashboard")
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("MS")
                        .help("Sampling interval in milliseconds (overrides the config file)")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print one JSON snapshot per tick instead of the dashboard")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("probe")
                .about("Detect the GPU provider and print a single reading"),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("monitor", sub_matches)) => commands::monitor::execute(sub_matches)?,
        Some(("probe", sub_matches)) => commands::probe::execute(sub_matches)?,
        _ => unreachable!("subcommand_required is set"),
    }

    Ok(())
}

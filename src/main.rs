use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use homepage::build::build_site;
use homepage::config::Config;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() {
    let matches = App::new("homepage")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .global(true)
                .help("Log per-file progress (overridden by RUST_LOG)"),
        )
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site")
                .arg(
                    Arg::with_name("project")
                        .short("p")
                        .long("project")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("A directory inside the project (default: current directory)"),
                )
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("The output directory (default: `_site` under the project root)"),
                ),
        )
        .get_matches();

    init_logging(matches.is_present("verbose"));

    let result = match matches.subcommand() {
        ("build", Some(build)) => run_build(build),
        _ => Ok(()),
    };

    if let Err(err) = result {
        tracing::error!("build failed");
        eprintln!("Error: {}", err);
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn run_build(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let project_dir = match matches.value_of("project") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    let output_dir = matches.value_of("output").map(Path::new);
    let config = Config::from_directory(&project_dir, output_dir)?;
    build_site(&config)?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = match verbose {
        true => "debug",
        false => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

use anyhow::{Context, Result};
use fflgz_common::design::Design;
use fflgz_placement::config::Config;

fn parse_args() -> Result<Config> {
    use clap::{App, Arg};
    let matches = App::new("fflgz")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Row legalization of placed flip-flops")
        .arg(
            Arg::with_name("MAX_STRIDE")
                .long("max-stride")
                .value_name("ROWS")
                .help("Maximum number of rows a cell may move away from its closest row")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("STRICT")
                .long("strict")
                .help("Fail if any cell can't be placed, instead of reporting it"),
        )
        .arg(
            Arg::with_name("VERIFY")
                .long("verify")
                .help("Check the result for overlaps and misaligned cells"),
        )
        .arg(
            Arg::with_name("INPUT")
                .help("Input design, JSON")
                .index(1)
                .required(true),
        )
        .arg(
            Arg::with_name("OUTPUT")
                .help("Output file location")
                .index(2)
                .required(true),
        )
        .get_matches();

    Config::from_args(&matches)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = parse_args()?;

    let design = Design::read_from(&config.io.input_file)?;
    let creator = config.io.input_file.display().to_string();

    let (output, report) = fflgz_placement::run(&design, &creator, &config.legalizer)
        .with_context(|| format!("Legalizing {}", creator))?;

    log::info!(
        "{} of {} cells placed, {} unplaced, total displacement {:.3}",
        report.placed(),
        output.cells.len(),
        output.unplaced().count(),
        report.total_displacement
    );

    output.write_to(&config.io.output_file)
}

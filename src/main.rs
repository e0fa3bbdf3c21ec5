use std::{
    fs::File,
    io::{self, BufWriter, Read, Write},
    process::ExitCode,
};

use anyhow::{Context, Result};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use exact_rref::{
    config::{Config, InputMode},
    parser,
    printer::ReportPrinter,
    solve::solve,
};

fn init_tracing(filter: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::new(filter))
        .init();
}

fn run(config: &Config) -> Result<()> {
    let input: Box<dyn Read> = match &config.input {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("could not open {}", path.display()))?,
        ),
        None => Box::new(io::stdin().lock()),
    };

    let (matrix, variables) = match config.mode {
        InputMode::Matrix => (
            parser::read_matrix(input).context("invalid matrix")?,
            None,
        ),
        InputMode::Equations => {
            let system = parser::read_equations(input).context("invalid equations")?;
            (system.matrix, Some(system.variables))
        }
    };
    debug!(rows = matrix.rows(), cols = matrix.cols(), "solving");

    let reduction = solve(matrix).context("row reduction failed")?;

    let mut report = ReportPrinter::new(&reduction, &config.print);
    if let Some(v) = &variables {
        report = report.with_variables(v);
    }

    let mut out = BufWriter::new(io::stdout().lock());
    write!(out, "{}", report)?;
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let config = Config::from_env();
    init_tracing(&config.log_filter);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

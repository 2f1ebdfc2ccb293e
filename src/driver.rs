//! Driver for the hls tool.
use crate::cmdline::{Opts, ReportFormat};
use hls_ir::{HlsInput, Report};
use hls_opt::{strategy_help, Pipeline};
use hls_utils::{Error, HlsResult};
use std::{
    fs::File,
    io::{self, BufReader, Write},
    path::Path,
};

/// Run the tool from the command line.
pub fn run_hls() -> HlsResult<()> {
    let opts: Opts = argh::from_env();

    env_logger::Builder::new()
        .format_timestamp(None)
        .filter_level(opts.log_level)
        .target(env_logger::Target::Stderr)
        .init();

    if opts.list_strategies {
        print!("{}", strategy_help());
        return Ok(());
    }

    let input = match &opts.file {
        Some(path) => read_input(path)?,
        None => HlsInput::from_json(io::stdin().lock())?,
    };
    log::info!(
        "{} operations in {} blocks, {} resource types",
        input.cdfg.operations.len(),
        input.cdfg.blocks.len(),
        input.library.resources.len()
    );

    let sol = Pipeline::new(opts.config()).run(&input)?;
    log::info!("area {} of {}", sol.area(&input), input.library.area_limit);

    let mut out = opts.output.get_write()?;
    write_report(&sol.report(&input), opts.format, &mut out)?;
    out.flush()?;
    Ok(())
}

fn read_input(path: &Path) -> HlsResult<HlsInput> {
    let file = File::open(path).map_err(|e| {
        Error::misc(format!("cannot read {}: {e}", path.display()))
    })?;
    HlsInput::from_json(BufReader::new(file))
}

/// Write `report` to `out` in the given format.
pub fn write_report<W: Write>(
    report: &Report,
    format: ReportFormat,
    out: &mut W,
) -> HlsResult<()> {
    match format {
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)?;
        }
        ReportFormat::Text => write!(out, "{report}")?,
    }
    Ok(())
}

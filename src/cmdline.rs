//! Command line parsing for the hls driver.
use argh::FromArgs;
use hls_opt::{AllocatorKind, BinderKind, PipelineConfig, SchedulerKind};
use hls_utils::OutputFile;
use std::{fmt, path::PathBuf, str::FromStr};

/// How the synthesis report is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Json,
    /// Cycles, instance counts and bindings as plain lines of numbers.
    Text,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ReportFormat::Json),
            "text" => Ok(ReportFormat::Text),
            _ => Err(format!(
                "unknown report format `{s}`, expected `json` or `text`"
            )),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Json => f.write_str("json"),
            ReportFormat::Text => f.write_str("text"),
        }
    }
}

#[derive(FromArgs)]
#[argh(help_triggers("-h", "--help"))]
/// Allocation, scheduling and binding of a control/data-flow graph.
pub struct Opts {
    /// input JSON with the resource library and the CDFG; stdin if omitted
    #[argh(positional)]
    pub file: Option<PathBuf>,

    /// output file, default is stdout
    #[argh(
        option,
        short = 'o',
        long = "output",
        default = "OutputFile::Stdout"
    )]
    pub output: OutputFile,

    /// resource allocation strategy (default: ilp)
    #[argh(option, default = "AllocatorKind::Ilp")]
    pub allocator: AllocatorKind,

    /// scheduling strategy (default: sdc)
    #[argh(option, default = "SchedulerKind::Sdc")]
    pub scheduler: SchedulerKind,

    /// binding strategy (default: shared)
    #[argh(option, default = "BinderKind::Shared")]
    pub binder: BinderKind,

    /// report format: json or text
    #[argh(option, default = "ReportFormat::Json")]
    pub format: ReportFormat,

    /// logging level (default: warn)
    #[argh(option, long = "log-level", default = "log::LevelFilter::Warn")]
    pub log_level: log::LevelFilter,

    /// list the available strategies and exit
    #[argh(switch, long = "list-strategies")]
    pub list_strategies: bool,
}

impl Opts {
    pub fn config(&self) -> PipelineConfig {
        PipelineConfig {
            allocator: self.allocator,
            scheduler: self.scheduler,
            binder: self.binder,
        }
    }
}

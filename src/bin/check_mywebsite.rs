use std::process;

use clap::Parser;
use tracing::{debug, Level};

use cmws_plugins::client::{CheckmywsClient, DEFAULT_API_URL};
use cmws_plugins::nagios::{check, NagiosOptions, OutputFormat};
use cmws_plugins::{init_logging, Report, Result, Runner, State};

/// Check my Website plugin.
#[derive(Debug, Parser)]
#[command(name = "check_mywebsite", disable_version_flag = true)]
struct Cli {
    /// Check id
    #[arg(required_unless_present = "version")]
    check_id: Option<String>,

    /// Display Nagios perfdata.
    #[arg(short = 'f', conflicts_with = "graphite")]
    perfdata: bool,

    /// Display Graphite perfdata.
    #[arg(short = 'g')]
    graphite: bool,

    /// Display extra output (Nagios like only).
    #[arg(short = 'e')]
    extra: bool,

    /// Proxy URL.
    #[arg(long, env = "CMWS_PROXY")]
    proxy: Option<String>,

    /// API URL.
    #[arg(long, env = "CMWS_API_URL", default_value = DEFAULT_API_URL)]
    url: String,

    /// Verbose.
    #[arg(short, long)]
    verbose: bool,

    /// Show version.
    #[arg(short = 'V', long)]
    version: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // with stdout and stderr gone the exit code is all that's left to report
            err.print().ok();
            process::exit(usage_exit_code(&err));
        }
    };

    let check_id = match (cli.version, cli.check_id.clone()) {
        (false, Some(check_id)) => check_id,
        _ => {
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            process::exit(State::Unknown.exit_code());
        }
    };

    init_logging(cli.verbose, Level::WARN);
    debug!(?cli, "command line arguments");

    Runner::new()
        .on_error(|_| State::Unknown)
        .safe_run(|| run(&cli, &check_id))
        .print_and_exit()
}

/// Usage errors are an unknown state for nagios, `--help` is not an error.
fn usage_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        State::Unknown.exit_code()
    } else {
        0
    }
}

fn run(cli: &Cli, check_id: &str) -> Result<Report> {
    let mut builder = CheckmywsClient::builder().endpoint(cli.url.as_str());
    if let Some(ref proxy) = cli.proxy {
        builder = builder.proxy(proxy.as_str());
    }
    let client = builder.build()?;

    let format = if cli.graphite {
        OutputFormat::Graphite
    } else {
        OutputFormat::Nagios
    };
    let options = NagiosOptions {
        extra: cli.extra,
        perfdata: cli.perfdata,
    };

    check(&client, check_id, format, &options)
}

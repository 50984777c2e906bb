use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info, Level};

use cmws_plugins::client::{CheckmywsClient, DEFAULT_API_URL};
use cmws_plugins::influx::{collect_points, write_all, Dsn, InfluxWriter, DEFAULT_DSN};
use cmws_plugins::{init_logging, Result, State};

/// Check my Website to InfluxDB
#[derive(Debug, Parser)]
#[command(name = "cmws2influxdb", version)]
struct Cli {
    /// Check id
    #[arg(required = true)]
    check_ids: Vec<String>,

    /// influxdb DSN
    #[arg(long, env = "INFLUXDB_DSN", default_value = DEFAULT_DSN)]
    influxdb: Dsn,

    /// Write every value as a float
    #[arg(long = "float")]
    coerce_float: bool,

    /// Proxy URL.
    #[arg(long, env = "CMWS_PROXY")]
    proxy: Option<String>,

    /// API URL.
    #[arg(long, env = "CMWS_API_URL", default_value = DEFAULT_API_URL)]
    url: String,

    /// Verbose
    #[arg(short)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, Level::INFO);

    debug!(influxdb = ?cli.influxdb, check_ids = ?cli.check_ids, "starting");

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("{}", err);
            ExitCode::from(State::Unknown.exit_code() as u8)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut builder = CheckmywsClient::builder().endpoint(cli.url.as_str());
    if let Some(ref proxy) = cli.proxy {
        builder = builder.proxy(proxy.as_str());
    }
    let client = builder.build()?;

    let points = collect_points(&client, &cli.check_ids, cli.coerce_float)?;

    let writer = InfluxWriter::new(cli.influxdb.clone())?;
    let written = write_all(&writer, &points, &cli.influxdb.database);

    info!(written, total = points.len(), "points written to influxdb");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse() {
        let cli = Cli::try_parse_from([
            "cmws2influxdb",
            "-v",
            "--float",
            "--influxdb=influxdb://u:p@db:8087/checks",
            "a",
            "b",
        ])
        .unwrap();

        assert_eq!(cli.check_ids, vec!["a".to_owned(), "b".to_owned()]);
        assert!(cli.verbose && cli.coerce_float);
        assert_eq!(&cli.influxdb.database, "checks");
        assert_eq!(cli.influxdb.url.as_str(), "http://db:8087/");
    }

    #[test]
    fn test_parse_errors() {
        assert!(Cli::try_parse_from(["cmws2influxdb"]).is_err());
        assert!(Cli::try_parse_from(["cmws2influxdb", "--influxdb=http://db/x", "a"]).is_err());
    }
}

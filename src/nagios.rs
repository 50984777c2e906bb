//! Builds the nagios/icinga plugin answer for a single check.

use std::collections::BTreeMap;

use tracing::debug;

use crate::client::StatusApi;
use crate::graphite::graphite_lines;
use crate::{CheckStatus, PerfDatum, Report, Result, Sample, Unit};

/// How the plugin output is laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// A nagios status line, with perfdata if requested.
    Nagios,
    /// Graphite plaintext lines instead of a status line.
    Graphite,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NagiosOptions {
    /// Append links to the status page and the console.
    pub extra: bool,
    pub perfdata: bool,
}

pub fn status_page_url(check_id: &str) -> String {
    format!("http://{}.status.checkmy.ws", check_id)
}

pub fn console_url(check_id: &str) -> String {
    format!("https://console.checkmy.ws/#/dashboard?_id={}", check_id)
}

/// Fetches the status of `check_id` and turns it into a report in the requested format.
pub fn check<A: StatusApi>(
    api: &A,
    check_id: &str,
    format: OutputFormat,
    options: &NagiosOptions,
) -> Result<Report> {
    let status = api.status(check_id)?;

    match format {
        OutputFormat::Nagios => Ok(nagios_report(check_id, &status, options)),
        OutputFormat::Graphite => Ok(Report::new(status.state(), &graphite_lines(&status)?)),
    }
}

/// Reshapes a status into a nagios report.
///
/// The timing families (`httptime`, `dnstime`) are labelled by location and get an extra
/// `<family>_mean` entry averaging their numeric values. Everything else is labelled by metric
/// name. Values that aren't numbers never show up in the perfdata.
pub fn nagios_report(check_id: &str, status: &CheckStatus, options: &NagiosOptions) -> Report {
    let mut text = status.summary();

    if options.extra {
        text = format!(
            "{} [<a href='{}'>status page</a>] [<a href='{}'>console</a>]",
            text,
            status_page_url(check_id),
            console_url(check_id)
        );
    }

    let mut report = Report::new(status.state(), &text);
    if !options.perfdata {
        return report;
    }

    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();

    for (metric, values) in &status.lastvalues {
        for (location, value) in values {
            let datum = match metric.as_str() {
                "state" => PerfDatum::numeric(metric, value).map(|d| {
                    d.with_unit(Unit::Percentage)
                        .with_min(0.0)
                        .with_max(100.0)
                }),
                "webtesttime" | "yslow_page_load_time" => PerfDatum::numeric(metric, value)
                    .map(|d| d.with_unit(Unit::Milliseconds).with_min(0.0)),
                "httptime" | "dnstime" => {
                    if let Some(v) = value.as_f64() {
                        let sum = sums.entry(metric.as_str()).or_insert((0.0, 0));
                        sum.0 += v;
                        sum.1 += 1;
                    }
                    PerfDatum::numeric(location, value)
                        .map(|d| d.with_unit(Unit::Milliseconds).with_min(0.0))
                }
                "yslow_score" => {
                    PerfDatum::numeric(metric, value).map(|d| d.with_min(0.0).with_max(100.0))
                }
                _ => PerfDatum::numeric(metric, value),
            };

            if let Some(datum) = datum {
                report.push(datum);
            }
        }
    }

    for (metric, (sum, count)) in sums {
        let mean = Sample::Float(sum / count as f64);
        report.push(
            PerfDatum::new(&format!("{}_mean", metric), mean)
                .with_unit(Unit::Milliseconds)
                .with_min(0.0),
        );
    }

    debug!(perfdata = ?report.perfdata(), "perfdata");
    report
}

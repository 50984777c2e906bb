//! The cmws_plugins crate forwards the state of Check my Website checks to nagios/icinga
//! (plugin output and exit code, nagios or graphite perfdata) and to InfluxDB.
//!
//! The plugin side is built from a [Report]: one status line, an optional perfdata section and
//! the [State] that becomes the process exit code.
//!
//! ```rust
//! # use cmws_plugins::{PerfDatum, Report, Sample, State, Unit};
//! let mut report = Report::new(State::Ok, "OK");
//! report.push(PerfDatum::new("paris", Sample::Int(120)).with_unit(Unit::Milliseconds).with_min(0.0));
//! assert_eq!(&report.to_nagios_string(), "OK | 'paris'=120ms;;;0;");
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::process;

#[macro_use]
mod macros;

pub mod client;
mod error;
pub mod graphite;
pub mod influx;
mod logging;
pub mod nagios;
mod runner;
pub mod status;

pub use crate::error::{Error, Result};
pub use crate::logging::init_logging;
pub use crate::runner::{Runner, RunnerResult};
pub use crate::status::{CheckStatus, Sample, Target, Worker};

/// What gets printed for nagios: a status text, perfdata, and the state to exit with.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    state: State,
    text: String,
    perfdata: Vec<PerfDatum>,
}

impl Report {
    pub fn new(state: State, text: &str) -> Report {
        Report {
            state,
            text: text.to_owned(),
            perfdata: Vec::new(),
        }
    }

    /// Appends a single perfdata entry.
    pub fn push(&mut self, datum: PerfDatum) {
        self.perfdata.push(datum)
    }

    pub fn perfdata(&self) -> &[PerfDatum] {
        &self.perfdata
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the single line nagios reads.
    ///
    /// The perfdata block is separated by `" | "` and only present if at least one entry was
    /// pushed.
    pub fn to_nagios_string(&self) -> String {
        let mut s = self.text.clone();

        if !self.perfdata.is_empty() {
            let perfdata: Vec<String> = self.perfdata.iter().map(|d| d.to_perf_string()).collect();
            s.push_str(" | ");
            s.push_str(&perfdata.join(" "));
        }

        s
    }

    pub fn exit_code(&self) -> i32 {
        self.state.exit_code()
    }

    /// Will print Self::to_nagios_string and exit with the exit code from Self::exit_code
    pub fn print_and_exit(&self) -> ! {
        println!("{}", self.to_nagios_string());
        process::exit(self.exit_code());
    }
}

/// Represents a service state from nagios.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum State {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl State {
    /// Maps a raw severity code to a state. Negative codes and codes above 3 are not valid
    /// nagios states and become Unknown.
    pub fn from_code(code: i64) -> State {
        match code {
            0 => State::Ok,
            1 => State::Warning,
            2 => State::Critical,
            _ => State::Unknown,
        }
    }

    /// Returns the corresponding nagios exit code to signal the service state of self.
    pub fn exit_code(&self) -> i32 {
        match self {
            State::Ok => 0,
            State::Warning => 1,
            State::Critical => 2,
            State::Unknown => 3,
        }
    }

    fn severity(&self) -> u8 {
        match self {
            State::Unknown => 0,
            State::Ok => 1,
            State::Warning => 2,
            State::Critical => 3,
        }
    }
}

/// Orders states by severity: Unknown < Ok < Warning < Critical.
impl Ord for State {
    fn cmp(&self, other: &State) -> Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &State) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            State::Ok => "OK",
            State::Warning => "WARNING",
            State::Critical => "CRITICAL",
            State::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// The purpose of ToPerfString is only so one can define custom representations of custom types
/// without using the ToString trait so we don't interfere with that.
pub trait ToPerfString {
    fn to_perf_string(&self) -> String;
}

impl_to_perf_string_on_to_string!(u8, u16, u32, u64, usize);
impl_to_perf_string_on_to_string!(i8, i16, i32, i64);
impl_to_perf_string_on_to_string!(f32, f64);
impl_to_perf_string_on_to_string!(String);

impl ToPerfString for Sample {
    fn to_perf_string(&self) -> String {
        self.to_string()
    }
}

impl ToPerfString for Unit {
    fn to_perf_string(&self) -> String {
        self.to_string()
    }
}

impl<T> ToPerfString for Option<T>
where
    T: ToPerfString,
{
    fn to_perf_string(&self) -> String {
        match self {
            Some(ref s) => s.to_perf_string(),
            None => String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Unit {
    None,
    Seconds,
    Milliseconds,
    Percentage,
    Bytes,
    Other(String),
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::None => Ok(()),
            Unit::Seconds => f.write_str("s"),
            Unit::Milliseconds => f.write_str("ms"),
            Unit::Percentage => f.write_str("%"),
            Unit::Bytes => f.write_str("B"),
            Unit::Other(unit) => f.write_str(unit),
        }
    }
}

/// A single perfdata entry: `'label'=value[unit];[warn];[crit];[min];[max]`.
///
/// All five value slots are always rendered, even when empty.
#[derive(Clone, Debug, PartialEq)]
pub struct PerfDatum {
    label: String,
    value: Sample,
    unit: Unit,
    min: Option<f64>,
    max: Option<f64>,
}

impl PerfDatum {
    pub fn new(label: &str, value: Sample) -> Self {
        PerfDatum {
            label: label.to_owned(),
            value,
            unit: Unit::None,
            min: None,
            max: None,
        }
    }

    /// Like [PerfDatum::new] but yields nothing for values nagios can't graph.
    pub fn numeric(label: &str, value: &Sample) -> Option<Self> {
        if value.is_number() {
            Some(PerfDatum::new(label, value.clone()))
        } else {
            None
        }
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &Sample {
        &self.value
    }
}

impl ToPerfString for PerfDatum {
    fn to_perf_string(&self) -> String {
        // `=` would end the label early, `'` is escaped by doubling
        let label = self.label.replace('=', "_").replace('\'', "''");

        perf_string!(
            format!("'{}'", label),
            format!("{}{}", self.value.to_perf_string(), self.unit.to_perf_string()),
            // no thresholds, the state comes from the API
            None::<f64>,
            None::<f64>,
            self.min,
            self.max
        )
    }
}

//! Reshapes check statuses into InfluxDB points and writes them.
//!
//! Every status produces one point per location for `httptime`, `dnstime` and `state`, plus one
//! per exported metadata field. All points of a status share the timestamp of its last check.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, error, warn};
use url::Url;

use crate::client::StatusApi;
use crate::status::now;
use crate::{CheckStatus, Error, Result, Sample, Target};

pub const DEFAULT_DSN: &str = "influxdb://localhost:8086/cmws";

const DEFAULT_PORT: u16 = 8086;
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);
const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Families of `lastvalues` forwarded per location.
const TIMINGS: &[&str] = &["httptime", "dnstime"];

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
}

impl FieldValue {
    /// Converts a sample, as a float if `coerce_float` is set. Non-numeric samples have no field
    /// value.
    pub fn from_sample(sample: &Sample, coerce_float: bool) -> Option<FieldValue> {
        match sample {
            Sample::Int(v) if !coerce_float => Some(FieldValue::Integer(*v)),
            Sample::Int(v) => Some(FieldValue::Float(*v as f64)),
            Sample::Float(v) => Some(FieldValue::Float(*v)),
            Sample::Other(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{}i", v),
            FieldValue::Float(v) => v.fmt(f),
        }
    }
}

/// One time series sample. `time` is in nanoseconds since the epoch.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
    pub time: i64,
}

impl Point {
    pub fn new(
        measurement: &str,
        tags: BTreeMap<String, String>,
        value: FieldValue,
        time: i64,
    ) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("value".to_owned(), value);

        Point {
            measurement: measurement.to_owned(),
            tags,
            fields,
            time,
        }
    }

    /// Renders the point in the InfluxDB line protocol. Tags with an empty key or value are left
    /// out since InfluxDB rejects them.
    pub fn to_line_protocol(&self) -> String {
        let mut line = escape(&self.measurement, &[',', ' ']);

        for (key, value) in self
            .tags
            .iter()
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        {
            line.push_str(&format!(
                ",{}={}",
                escape(key, &[',', '=', ' ']),
                escape(value, &[',', '=', ' '])
            ));
        }

        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(key, value)| format!("{}={}", escape(key, &[',', '=', ' ']), value))
            .collect();

        line.push(' ');
        line.push_str(&fields.join(","));
        line.push_str(&format!(" {}", self.time));
        line
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line_protocol())
    }
}

/// Backslash-escapes `special`. Backslashes and newlines are always escaped, a raw newline
/// would end the line.
fn escape(s: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => escaped.push_str("\\n"),
            '\\' => escaped.push_str("\\\\"),
            c if special.contains(&c) => {
                escaped.push('\\');
                escaped.push(c);
            }
            c => escaped.push(c),
        }
    }
    escaped
}

/// Reshapes one status into points.
///
/// Locations are tagged with the metadata of the worker that probed them. A location without a
/// known worker keeps a plain `location` tag instead.
pub fn points(check_id: &str, status: &CheckStatus, coerce_float: bool) -> Result<Vec<Point>> {
    let target = status.target()?;
    let time = match status.timestamp().checked_mul(NANOS_PER_SECOND) {
        Some(time) => time,
        None => {
            warn!(check_id, lastcheck = status.timestamp(), "lastcheck out of range, using now");
            now() * NANOS_PER_SECOND
        }
    };
    let base = base_tags(check_id, status, &target);

    let mut points = Vec::new();
    let mut push = |measurement: &str, tags: BTreeMap<String, String>, sample: &Sample| {
        match FieldValue::from_sample(sample, coerce_float) {
            Some(value) => points.push(Point::new(measurement, tags, value, time)),
            None => warn!(check_id, measurement, %sample, "dropping non numeric value"),
        }
    };

    for &family in TIMINGS {
        if let Some(values) = status.lastvalues.get(family) {
            for (location, sample) in values {
                push(family, location_tags(&base, status, location), sample);
            }
        }
    }

    for (location, sample) in &status.states {
        push("state", location_tags(&base, status, location), sample);
    }

    for (label, sample) in status.exported_metas() {
        push(label, base.clone(), sample);
    }

    debug!(check_id, count = points.len(), "reshaped status");
    Ok(points)
}

fn base_tags(check_id: &str, status: &CheckStatus, target: &Target) -> BTreeMap<String, String> {
    let mut tags: BTreeMap<String, String> = status.tag_pairs().into_iter().collect();

    tags.insert("_id".to_owned(), check_id.to_owned());
    tags.insert("url".to_owned(), status.url.clone());
    tags.insert("hostname".to_owned(), target.hostname.clone());
    tags.insert("path".to_owned(), target.path.clone());
    if let Some(ref name) = status.name {
        tags.insert("name".to_owned(), name.clone());
    }

    tags
}

fn location_tags(
    base: &BTreeMap<String, String>,
    status: &CheckStatus,
    location: &str,
) -> BTreeMap<String, String> {
    let mut tags = base.clone();

    match status.workers.get(location) {
        Some(worker) => {
            for (key, value) in worker.tags() {
                tags.insert(key.to_owned(), value);
            }
        }
        None => {
            tags.insert("location".to_owned(), location.to_owned());
        }
    }

    tags
}

/// Fetches every distinct check once, in order, and reshapes the answers. The first failing
/// fetch aborts.
pub fn collect_points<A, S>(api: &A, check_ids: &[S], coerce_float: bool) -> Result<Vec<Point>>
where
    A: StatusApi,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut points = Vec::new();

    for check_id in check_ids {
        let check_id: &str = check_id.as_ref();
        if !seen.insert(check_id) {
            continue;
        }

        let status = api.status(check_id)?;
        points.extend(self::points(check_id, &status, coerce_float)?);
    }

    Ok(points)
}

/// Connection settings in the `influxdb://[user:password@]host[:port]/database` form.
/// `https+influxdb://` selects TLS.
#[derive(Clone, PartialEq)]
pub struct Dsn {
    pub url: Url,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: String,
}

impl fmt::Debug for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dsn")
            .field("url", &self.url.as_str())
            .field("username", &self.username)
            .field("database", &self.database)
            .finish()
    }
}

impl FromStr for Dsn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Dsn> {
        let dsn = Url::parse(s).map_err(|e| Error::Dsn(format!("{}: {}", s, e)))?;

        let scheme = match dsn.scheme() {
            "influxdb" => "http",
            "https+influxdb" => "https",
            other => return Err(Error::Dsn(format!("unsupported scheme {:?}", other))),
        };

        let host = dsn
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::Dsn(format!("{}: missing host", s)))?;
        let port = dsn.port().unwrap_or(DEFAULT_PORT);

        let url = Url::parse(&format!("{}://{}:{}/", scheme, host, port))
            .map_err(|e| Error::Dsn(format!("{}: {}", s, e)))?;

        let database = dsn.path().trim_matches('/').to_owned();
        if database.is_empty() {
            return Err(Error::Dsn(format!("{}: missing database", s)));
        }

        let username = Some(dsn.username())
            .filter(|u| !u.is_empty())
            .map(str::to_owned);
        let password = dsn.password().map(str::to_owned);

        Ok(Dsn {
            url,
            username,
            password,
            database,
        })
    }
}

/// Where points end up.
pub trait PointSink {
    fn write(&self, point: &Point, database: &str) -> Result<()>;
}

/// Writes points through the InfluxDB 1.x http write API.
pub struct InfluxWriter {
    client: Client,
    dsn: Dsn,
}

impl InfluxWriter {
    pub fn new(dsn: Dsn) -> Result<Self> {
        let client = Client::builder().timeout(WRITE_TIMEOUT).build()?;
        Ok(InfluxWriter { client, dsn })
    }

    fn write_url(&self, database: &str) -> Url {
        let mut url = self.dsn.url.clone();
        url.set_path("/write");
        url.query_pairs_mut()
            .append_pair("db", database)
            .append_pair("precision", "ns");
        url
    }
}

impl PointSink for InfluxWriter {
    fn write(&self, point: &Point, database: &str) -> Result<()> {
        let mut request = self
            .client
            .post(self.write_url(database))
            .body(point.to_line_protocol());

        if let Some(ref username) = self.dsn.username {
            request = request.basic_auth(username, self.dsn.password.as_ref());
        }

        let response = request.send()?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(Error::Http(format!(
                "InfluxDB returned status {}: {}",
                status,
                body.trim()
            )));
        }

        Ok(())
    }
}

/// Writes the points one by one. A failed write is logged and skipped; returns how many points
/// made it.
pub fn write_all<S: PointSink>(sink: &S, points: &[Point], database: &str) -> usize {
    let mut written = 0;

    for point in points {
        debug!(%point, "influxdb write");

        match sink.write(point, database) {
            Ok(()) => written += 1,
            Err(err) => error!(%point, %err, "impossible to write point"),
        }
    }

    written
}

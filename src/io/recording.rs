//! Recorded session for offline replay.
//!
//! A recording directory holds three headerless CSV files (`#` comments allowed):
//!
//! - `observer.csv`: `timestamp_ns, x, y, z` (camera position, world frame)
//! - `markers.csv`: `timestamp_ns, marker, tracked, px, py, pz, qw, qx, qy, qz`
//! - `commands.csv`: `timestamp_ns, command[, argument]` where command is one
//!   of `confirm`, `select <destination>`, `stop`, `reset`
//!
//! `commands.csv` is optional.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, StringRecord};
use nalgebra::Vector3;
use tracing::warn;

use crate::alignment::MarkerId;
use crate::geometry::SE3;
use crate::session::{MarkerObservation, SessionEvent};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverSample {
    pub timestamp_ns: u64,
    pub position: Vector3<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSample {
    pub timestamp_ns: u64,
    pub observation: MarkerObservation,
}

/// User command from the recorded UI stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Confirm,
    Select(String),
    Stop,
    Reset,
}

impl Command {
    pub fn to_event(&self) -> SessionEvent {
        match self {
            Command::Confirm => SessionEvent::ConfirmPlacement,
            Command::Select(name) => SessionEvent::SelectDestination(name.clone()),
            Command::Stop => SessionEvent::StopNavigation,
            Command::Reset => SessionEvent::Reset,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandEntry {
    pub timestamp_ns: u64,
    pub command: Command,
}

#[derive(Debug, Default)]
pub struct Recording {
    pub observer: Vec<ObserverSample>,
    pub markers: Vec<MarkerSample>,
    pub commands: Vec<CommandEntry>,
}

impl Recording {
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let observer = read_observer(open(&root.join("observer.csv"))?)
            .with_context(|| format!("Invalid observer.csv in {}", root.display()))?;
        let markers = read_markers(open(&root.join("markers.csv"))?)
            .with_context(|| format!("Invalid markers.csv in {}", root.display()))?;

        let commands_path = root.join("commands.csv");
        let commands = if commands_path.exists() {
            read_commands(open(&commands_path)?)
                .with_context(|| format!("Invalid commands.csv in {}", root.display()))?
        } else {
            warn!("No commands.csv in {}; replaying without user input", root.display());
            Vec::new()
        };

        Ok(Self {
            observer,
            markers,
            commands,
        })
    }

    pub fn len(&self) -> usize {
        self.observer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observer.is_empty()
    }

    /// Marker and command events with `after < timestamp <= until`, in time order.
    ///
    /// At equal timestamps marker samples come before commands, so a confirm
    /// recorded together with a detection sees that detection.
    pub fn events_between(&self, after: Option<u64>, until: u64) -> Vec<SessionEvent> {
        let in_window = |ts: u64| after.is_none_or(|a| ts > a) && ts <= until;

        let mut timed: Vec<(u64, u8, SessionEvent)> = Vec::new();
        for m in self.markers.iter().filter(|m| in_window(m.timestamp_ns)) {
            timed.push((
                m.timestamp_ns,
                0,
                SessionEvent::MarkerObserved(m.observation.clone()),
            ));
        }
        for c in self.commands.iter().filter(|c| in_window(c.timestamp_ns)) {
            timed.push((c.timestamp_ns, 1, c.command.to_event()));
        }
        timed.sort_by_key(|(ts, order, _)| (*ts, *order));
        timed.into_iter().map(|(_, _, e)| e).collect()
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open {}", path.display()))
}

fn records<R: Read>(reader: R) -> csv::StringRecordsIntoIter<R> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader)
        .into_records()
}

fn field<T: std::str::FromStr>(rec: &StringRecord, i: usize, name: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = rec
        .get(i)
        .with_context(|| format!("Missing column {} ({})", i, name))?;
    raw.parse()
        .with_context(|| format!("Bad {} '{}'", name, raw))
}

/// Fail on rows shorter than `n` columns.
fn require_columns(rec: &StringRecord, n: usize, what: &str) -> Result<()> {
    if rec.len() < n {
        let line = rec.position().map_or(0, |p| p.line());
        bail!(
            "{} row at line {} has {} columns, expected at least {}",
            what,
            line,
            rec.len(),
            n
        );
    }
    Ok(())
}

/// Marker pose from `px,py,pz,qw,qx,qy,qz` starting at column 3.
fn marker_pose(rec: &StringRecord) -> Result<SE3> {
    let position: Vector3<f64> = Vector3::new(field(rec, 3, "px")?, field(rec, 4, "py")?, field(rec, 5, "pz")?);
    let (w, x, y, z): (f64, f64, f64, f64) = (
        field(rec, 6, "qw")?,
        field(rec, 7, "qx")?,
        field(rec, 8, "qy")?,
        field(rec, 9, "qz")?,
    );
    if !position.iter().all(|v| v.is_finite()) {
        bail!("Non-finite marker position in '{}'", &rec[1]);
    }
    let norm_sq = w * w + x * x + y * y + z * z;
    if !norm_sq.is_finite() || norm_sq < 1e-12 {
        bail!("Zero or non-finite marker quaternion in '{}'", &rec[1]);
    }
    Ok(SE3::from_quaternion(w, x, y, z, position))
}

pub fn read_observer<R: Read>(reader: R) -> Result<Vec<ObserverSample>> {
    let mut samples = Vec::new();
    for rec in records(reader) {
        let rec = rec?;
        require_columns(&rec, 4, "Observer")?;
        samples.push(ObserverSample {
            timestamp_ns: field(&rec, 0, "timestamp")?,
            position: Vector3::new(field(&rec, 1, "x")?, field(&rec, 2, "y")?, field(&rec, 3, "z")?),
        });
    }
    if samples.windows(2).any(|w| w[1].timestamp_ns < w[0].timestamp_ns) {
        bail!("Observer samples are not in time order");
    }
    Ok(samples)
}

fn parse_tracked(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "tracking" => Ok(true),
        "0" | "false" | "limited" | "none" => Ok(false),
        other => bail!("Bad tracked flag '{}'", other),
    }
}

pub fn read_markers<R: Read>(reader: R) -> Result<Vec<MarkerSample>> {
    let mut samples = Vec::new();
    for rec in records(reader) {
        let rec = rec?;
        require_columns(&rec, 10, "Marker")?;
        let pose = marker_pose(&rec)?;
        samples.push(MarkerSample {
            timestamp_ns: field(&rec, 0, "timestamp")?,
            observation: MarkerObservation {
                marker: MarkerId::new(&rec[1]),
                pose,
                tracked: parse_tracked(&rec[2])?,
            },
        });
    }
    Ok(samples)
}

pub fn read_commands<R: Read>(reader: R) -> Result<Vec<CommandEntry>> {
    let mut entries = Vec::new();
    for rec in records(reader) {
        let rec = rec?;
        require_columns(&rec, 2, "Command")?;
        let timestamp_ns: u64 = field(&rec, 0, "timestamp")?;
        let command = match rec[1].to_ascii_lowercase().as_str() {
            "confirm" => Command::Confirm,
            "select" => {
                let name = rec.get(2).filter(|s| !s.is_empty());
                let Some(name) = name else {
                    bail!("`select` at {} has no destination", timestamp_ns);
                };
                Command::Select(name.to_string())
            }
            "stop" => Command::Stop,
            "reset" => Command::Reset,
            other => bail!("Unknown command '{}' at {}", other, timestamp_ns),
        };
        entries.push(CommandEntry {
            timestamp_ns,
            command,
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_read_observer() {
        let csv = "# t, x, y, z\n0,0.0,1.5,0.0\n250000000, 0.5, 1.5, 0.1\n";
        let samples = read_observer(csv.as_bytes()).unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].timestamp_ns, 250_000_000);
        assert_relative_eq!(samples[1].position, Vector3::new(0.5, 1.5, 0.1), epsilon = 1e-12);
    }

    #[test]
    fn test_observer_out_of_order_rejected() {
        assert!(read_observer("10,0,0,0\n5,0,0,0\n".as_bytes()).is_err());
    }

    #[test]
    fn test_read_markers() {
        let csv = "100,AnchorLobby,1,0.0,1.2,2.0,1,0,0,0\n200,AnchorLobby,limited,0,0,0,1,0,0,0\n";
        let samples = read_markers(csv.as_bytes()).unwrap();

        assert_eq!(samples.len(), 2);
        assert!(samples[0].observation.tracked);
        assert!(!samples[1].observation.tracked);
        assert_eq!(samples[0].observation.marker.as_str(), "AnchorLobby");
    }

    #[test]
    fn test_invalid_marker_rotation_rejected() {
        assert!(read_markers("100,AnchorLobby,1,0.0,0.0,2.0,0,0,0,0\n".as_bytes()).is_err());
        assert!(read_markers("100,AnchorLobby,1,0.0,0.0,2.0,NaN,0,0,0\n".as_bytes()).is_err());
        assert!(read_markers("100,AnchorLobby,1,inf,0.0,2.0,1,0,0,0\n".as_bytes()).is_err());
    }

    #[test]
    fn test_short_rows_rejected() {
        assert!(read_observer("0,0.0,1.5,0.0\n100,0.5,1.5\n".as_bytes()).is_err());
        assert!(read_markers("100,AnchorLobby,1,0.0,0.0,2.0,1,0,0\n".as_bytes()).is_err());
        assert!(read_commands("0,confirm\n10\n".as_bytes()).is_err());
    }

    #[test]
    fn test_read_commands() {
        let csv = "0,confirm\n10,select,Main Library\n20,stop\n30,reset\n";
        let commands = read_commands(csv.as_bytes()).unwrap();

        assert_eq!(commands[1].command, Command::Select("Main Library".to_string()));
        assert_eq!(commands[3].command, Command::Reset);
        assert!(read_commands("0,select\n".as_bytes()).is_err());
        assert!(read_commands("0,jump\n".as_bytes()).is_err());
    }

    #[test]
    fn test_events_between_orders_markers_first() {
        let recording = Recording {
            observer: Vec::new(),
            markers: read_markers("100,AnchorLobby,1,0,0,2,1,0,0,0\n".as_bytes()).unwrap(),
            commands: read_commands("100,confirm\n300,stop\n".as_bytes()).unwrap(),
        };

        let events = recording.events_between(None, 100);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SessionEvent::MarkerObserved(_)));
        assert_eq!(events[1], SessionEvent::ConfirmPlacement);

        assert!(recording.events_between(Some(100), 299).is_empty());
        assert_eq!(recording.events_between(Some(100), 300), vec![SessionEvent::StopNavigation]);
    }
}

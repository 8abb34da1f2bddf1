//! Blocking MethodSCRIPT session over an exclusively owned [`Link`].
//!
//! The session moves through `Connected -> Busy -> Connected` while scripts run.
//! Any framing violation or link failure parks it in `Error`; from there only
//! [`Session::abort_and_sync`] or a reconnect brings it back.

use crate::config::SessionConfig;
use crate::devices::{device_type_from_firmware, DeviceType};
use crate::error::SessionError;
use crate::metrics::{MetricsHub, ProtocolMetrics};
use crate::parser::{parse_result, ScriptResult};
use mscript_link::{Link, LINE_TERMINATOR};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

type Result<T, E = SessionError> = core::result::Result<T, E>;

const CMD_FIRMWARE: &str = "t\n";
const CMD_MSCRIPT_VERSION: &str = "v\n";
const CMD_SERIAL_NUMBER: &str = "i\n";
const CMD_ABORT: &str = "Z\n";
const ABORT_ACK: &str = "Z\n";
const ABORT_IDLE: &str = "Z!0006\n";
const END_OF_OUTPUT: &str = "\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    /// Link open; the device's script state is whatever the last command left.
    Connected,
    /// A script was sent and its output has not been fully read.
    Busy,
    /// A framing violation or link failure occurred.
    Error,
}

/// Outcome of one line read. A timeout is not a failure: long measurements
/// can be silent for seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRead {
    Line(String),
    Timeout,
}

/// Output of one script run, stamped for the persistence layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub started_at: OffsetDateTime,
    pub finished_at: OffsetDateTime,
    pub device_type: DeviceType,
    pub result: ScriptResult,
}

impl Measurement {
    pub fn to_json(&self) -> Value {
        let curves: Vec<Value> = self
            .result
            .curves
            .iter()
            .map(|curve| {
                Value::Array(
                    curve
                        .packages
                        .iter()
                        .map(|package| {
                            Value::Array(
                                package
                                    .variables
                                    .iter()
                                    .map(|var| {
                                        let vt = var.var_type();
                                        json!({
                                            "id": var.id(),
                                            "name": vt.name(),
                                            "unit": vt.unit(),
                                            "value": var.value(),
                                            "status": var.status_text(),
                                            "range": var.range_text(self.device_type),
                                        })
                                    })
                                    .collect(),
                            )
                        })
                        .collect(),
                )
            })
            .collect();
        json!({
            "device_type": self.device_type.label(),
            "started_at": self.started_at.format(&Rfc3339).ok(),
            "finished_at": self.finished_at.format(&Rfc3339).ok(),
            "curves": curves,
        })
    }
}

pub struct Session<L: Link> {
    link: L,
    state: SessionState,
    firmware_version: Option<String>,
    device_type: DeviceType,
    error_settle: Duration,
    metrics: Option<MetricsHub>,
}

impl<L: Link> Session<L> {
    pub fn new(link: L) -> Self {
        Self::with_config(link, &SessionConfig::default())
    }

    pub fn with_config(link: L, config: &SessionConfig) -> Self {
        info!(link = link.name(), "session connected");
        Self {
            link,
            state: SessionState::Connected,
            firmware_version: None,
            device_type: DeviceType::Unknown,
            error_settle: config.error_settle(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, hub: &MetricsHub) -> Self {
        self.metrics = Some(hub.clone());
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn into_link(self) -> L {
        self.link
    }

    /// Cached firmware version, if it has been queried.
    pub fn firmware_version(&self) -> Option<&str> {
        self.firmware_version.as_deref()
    }

    /// Cached device type; `Unknown` until identified.
    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    /// Close the link. The session cannot be reused afterwards.
    pub fn disconnect(&mut self) {
        if self.state == SessionState::Disconnected {
            return;
        }
        if let Err(e) = self.link.close() {
            warn!(link = self.link.name(), "closing link failed: {e}");
        }
        self.state = SessionState::Disconnected;
        self.firmware_version = None;
        self.device_type = DeviceType::Unknown;
        info!(link = self.link.name(), "session disconnected");
        if let Some(hub) = &self.metrics {
            debug!("protocol counters at disconnect:\n{hub}");
        }
    }

    fn counters(&self) -> Option<&ProtocolMetrics> {
        self.metrics.as_ref().map(|hub| &hub.protocol)
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            SessionState::Disconnected => Err(SessionError::NotConnected),
            SessionState::Error => Err(SessionError::Faulted),
            SessionState::Connected | SessionState::Busy => Ok(()),
        }
    }

    fn ensure_idle(&self) -> Result<()> {
        self.ensure_open()?;
        if self.state == SessionState::Busy {
            return Err(SessionError::Busy);
        }
        Ok(())
    }

    fn fault(&mut self, err: SessionError) -> SessionError {
        error!(link = self.link.name(), "session entering error state: {err}");
        self.state = SessionState::Error;
        err
    }

    /// Write ASCII text verbatim.
    pub fn write(&mut self, text: &str) -> Result<()> {
        self.ensure_open()?;
        if !text.is_ascii() {
            warn!("rejecting non-ASCII text of {} bytes", text.len());
            return Err(SessionError::NonAscii);
        }
        debug!(tx = %text.escape_debug(), "write");
        if let Err(e) = self.link.write_all(text.as_bytes()) {
            return Err(self.fault(e.into()));
        }
        if let Some(m) = self.counters() {
            m.bytes_tx.inc_by(text.len() as u64);
        }
        Ok(())
    }

    /// One blocking read. The returned line keeps its terminator.
    pub fn readline(&mut self) -> Result<LineRead> {
        self.ensure_open()?;
        let bytes = match self.link.read_line() {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.fault(e.into())),
        };
        if bytes.is_empty() {
            if let Some(m) = self.counters() {
                m.read_timeouts.inc();
            }
            return Ok(LineRead::Timeout);
        }
        if bytes.last() != Some(&LINE_TERMINATOR) {
            let partial = String::from_utf8_lossy(&bytes).into_owned();
            return Err(self.fault(SessionError::Communication(format!(
                "line without terminator: {partial:?}"
            ))));
        }
        let line = match String::from_utf8(bytes) {
            Ok(line) if line.is_ascii() => line,
            _ => {
                return Err(
                    self.fault(SessionError::Communication("non-ASCII response".to_string()))
                )
            }
        };
        if let Some(m) = self.counters() {
            m.lines_rx.inc();
        }
        debug!(rx = %line.escape_debug(), "read");
        Ok(LineRead::Line(line))
    }

    /// Read until the bare end-of-output line, absorbing timeouts. The end
    /// marker itself is not returned.
    pub fn readlines_until_end(&mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        loop {
            match self.readline()? {
                LineRead::Timeout => continue,
                LineRead::Line(line) if line == END_OF_OUTPUT => break,
                LineRead::Line(line) => lines.push(line),
            }
        }
        if self.state == SessionState::Busy {
            self.state = SessionState::Connected;
        }
        Ok(lines)
    }

    /// Send a script file line by line. Line endings are normalized to `\n`.
    pub fn send_script(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SessionError::Script {
            path: path.to_path_buf(),
            source,
        })?;
        info!(script = %path.display(), "sending script");
        self.send_script_text(&text)
    }

    /// Send script text line by line. Line endings are normalized to `\n`.
    pub fn send_script_text(&mut self, text: &str) -> Result<()> {
        self.ensure_idle()?;
        if !text.is_ascii() {
            warn!("rejecting script with non-ASCII characters");
            return Err(SessionError::NonAscii);
        }
        for line in text.lines() {
            self.write(&format!("{line}\n"))?;
        }
        self.state = SessionState::Busy;
        Ok(())
    }

    /// Send a script, collect all of its output and split it into curves.
    pub fn run_script(&mut self, path: impl AsRef<Path>) -> Result<Measurement> {
        let started_at = OffsetDateTime::now_utc();
        self.send_script(path)?;
        self.collect(started_at)
    }

    pub fn run_script_text(&mut self, text: &str) -> Result<Measurement> {
        let started_at = OffsetDateTime::now_utc();
        self.send_script_text(text)?;
        self.collect(started_at)
    }

    fn collect(&mut self, started_at: OffsetDateTime) -> Result<Measurement> {
        let lines = self.readlines_until_end()?;
        let result = parse_result(&lines)?;
        if let Some(m) = self.counters() {
            m.packages_decoded.inc_by(result.package_count() as u64);
        }
        debug!(
            curves = result.curves.len(),
            packages = result.package_count(),
            "script finished"
        );
        Ok(Measurement {
            started_at,
            finished_at: OffsetDateTime::now_utc(),
            device_type: self.device_type,
            result,
        })
    }

    /// Read one reply line of a command. On timeout the reply may still arrive,
    /// so the session stays `Busy` until drained or resynchronized.
    fn read_response_line(&mut self) -> Result<String> {
        match self.readline()? {
            LineRead::Line(line) => Ok(line),
            LineRead::Timeout => {
                warn!("reply timed out, session held busy until resynchronized");
                self.state = SessionState::Busy;
                Err(SessionError::NoResponse)
            }
        }
    }

    fn query_single_line(&mut self, command: &str) -> Result<String> {
        self.ensure_idle()?;
        self.write(command)?;
        let line = self.read_response_line()?;
        // Strip the echoed command character and the terminator
        let mut chars = line.chars();
        chars.next();
        chars.next_back();
        Ok(chars.as_str().to_string())
    }

    /// Firmware identification string, cached after the first query.
    pub fn get_firmware_version(&mut self, force: bool) -> Result<String> {
        if !force {
            if let Some(version) = &self.firmware_version {
                return Ok(version.clone());
            }
        }
        self.ensure_idle()?;
        self.write(CMD_FIRMWARE)?;
        let first = self.read_response_line()?;
        let second = self.read_response_line()?;
        let first = first.strip_suffix('\n').unwrap_or(&first);
        let first = first.get(1..).unwrap_or("");
        let second = second.strip_suffix('\n').unwrap_or(&second);
        let second = second.strip_suffix('*').unwrap_or(second);
        let version = format!("{} {}", first.trim(), second.trim())
            .trim()
            .to_string();
        info!(firmware = %version, "identified firmware");
        self.device_type = device_type_from_firmware(&version);
        self.firmware_version = Some(version.clone());
        Ok(version)
    }

    /// Device family derived from the firmware version. Never fails: any
    /// problem identifying the device yields `Unknown`.
    pub fn get_device_type(&mut self, force: bool) -> DeviceType {
        match self.get_firmware_version(force) {
            Ok(version) => {
                let device_type = device_type_from_firmware(&version);
                if device_type == DeviceType::Unknown {
                    warn!(firmware = %version, "unrecognized device type");
                }
                self.device_type = device_type;
                device_type
            }
            Err(e) => {
                warn!("device identification failed: {e}");
                DeviceType::Unknown
            }
        }
    }

    pub fn get_mscript_version(&mut self) -> Result<String> {
        self.query_single_line(CMD_MSCRIPT_VERSION)
    }

    pub fn get_serial_number(&mut self) -> Result<String> {
        self.query_single_line(CMD_SERIAL_NUMBER)
    }

    /// Bring the device to a known idle state whatever it was doing before.
    ///
    /// Flushes the device input buffer, aborts, and either waits out the error
    /// settle delay (nothing was running) or drains the aborted script's output.
    pub fn abort_and_sync(&mut self) -> Result<()> {
        match self.state {
            SessionState::Disconnected => return Err(SessionError::NotConnected),
            SessionState::Error => {
                info!(link = self.link.name(), "attempting resynchronization");
                self.state = SessionState::Busy;
            }
            SessionState::Connected | SessionState::Busy => {}
        }
        if let Some(m) = self.counters() {
            m.aborts.inc();
        }
        self.write(END_OF_OUTPUT)?;
        self.write(CMD_ABORT)?;
        let response = loop {
            match self.readline()? {
                LineRead::Timeout => continue,
                LineRead::Line(line) if line.starts_with('Z') => break line,
                LineRead::Line(line) => {
                    debug!(line = %line.escape_debug(), "discarding stale output")
                }
            }
        };
        match response.as_str() {
            ABORT_IDLE => {
                thread::sleep(self.error_settle);
                self.state = SessionState::Connected;
                debug!("no script was running");
            }
            ABORT_ACK => {
                warn!("aborted a running script, draining its output");
                self.state = SessionState::Busy;
                self.readlines_until_end()?;
            }
            other => {
                return Err(self.fault(SessionError::Communication(format!(
                    "unexpected abort response: {other:?}"
                ))));
            }
        }
        Ok(())
    }
}

#[cfg(feature = "serial")]
pub fn open_serial(config: &SessionConfig) -> Result<Session<mscript_link::SerialLink>> {
    let link = mscript_link::SerialLink::open_with(&config.port, config.link_settings())?;
    Ok(Session::with_config(link, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mscript_link::MockLink;
    use std::time::Instant;

    fn session(responses: &[&str]) -> Session<MockLink> {
        Session::new(MockLink::with_responses(responses.iter().copied()))
    }

    #[test]
    fn test_readline_timeout_is_not_an_error() {
        let mut s = session(&["", "e\n"]);
        assert_eq!(s.readline().unwrap(), LineRead::Timeout);
        assert_eq!(s.readline().unwrap(), LineRead::Line("e\n".to_string()));
        assert_eq!(s.state(), SessionState::Connected);
    }

    #[test]
    fn test_partial_line_is_fatal() {
        let mut s = session(&["Pba80"]);
        assert!(matches!(s.readline(), Err(SessionError::Communication(_))));
        assert_eq!(s.state(), SessionState::Error);
        assert!(matches!(s.write("t\n"), Err(SessionError::Faulted)));
        assert!(matches!(s.readline(), Err(SessionError::Faulted)));
    }

    #[test]
    fn test_write_rejects_non_ascii() {
        let mut s = session(&[]);
        assert!(matches!(s.write("set_e 100µ\n"), Err(SessionError::NonAscii)));
        assert!(s.link().written().is_empty());
        assert_eq!(s.state(), SessionState::Connected);
    }

    #[test]
    fn test_readlines_until_end_absorbs_timeouts() {
        let mut s = session(&["e\n", "", "Pba8000000m\n", "", "", "*\n", "\n", "later\n"]);
        let lines = s.readlines_until_end().unwrap();
        assert_eq!(lines, vec!["e\n", "Pba8000000m\n", "*\n"]);
        assert_eq!(s.link().pending(), 1);
    }

    #[test]
    fn test_link_failure_faults_session() {
        let mut s = session(&["e\n"]);
        assert!(matches!(
            s.readlines_until_end(),
            Err(SessionError::Link(mscript_link::LinkError::Closed))
        ));
        assert_eq!(s.state(), SessionState::Error);
    }

    #[test]
    fn test_send_script_text_normalizes_line_endings() {
        let mut s = session(&[]);
        s.send_script_text("e\r\nvar c\r\nset_pgstat_mode 2\n\n")
            .unwrap();
        assert_eq!(s.link().written_text(), "e\nvar c\nset_pgstat_mode 2\n\n");
        assert_eq!(s.state(), SessionState::Busy);
        assert!(matches!(s.get_serial_number(), Err(SessionError::Busy)));
        assert!(matches!(
            s.send_script_text("e\n\n"),
            Err(SessionError::Busy)
        ));
    }

    #[test]
    fn test_send_script_from_file() -> anyhow::Result<()> {
        let tmp = tempfile::NamedTempFile::new()?;
        fs::write(tmp.path(), "e\r\nwait 10m\r\n\r\n")?;
        let mut s = session(&[]);
        s.send_script(tmp.path())?;
        assert_eq!(s.link().written_text(), "e\nwait 10m\n\n");
        Ok(())
    }

    #[test]
    fn test_send_script_missing_file() {
        let mut s = session(&[]);
        let err = s.send_script("/nonexistent/script.mscr").unwrap_err();
        assert!(matches!(err, SessionError::Script { .. }));
        assert_eq!(s.state(), SessionState::Connected);
    }

    #[test]
    fn test_firmware_version_is_cached() {
        let mut s = session(&[
            "tespico1.2\n",
            "R1.2 Nov 22 2023*\n",
            "tespico1.3\n",
            "R1.3 Jan 10 2024*\n",
        ]);
        let version = s.get_firmware_version(false).unwrap();
        assert_eq!(version, "espico1.2 R1.2 Nov 22 2023");
        assert_eq!(s.get_firmware_version(false).unwrap(), version);
        assert_eq!(s.link().written_text(), "t\n");
        assert_eq!(s.device_type(), DeviceType::EmStatPico);

        let forced = s.get_firmware_version(true).unwrap();
        assert_eq!(forced, "espico1.3 R1.3 Jan 10 2024");
        assert_eq!(s.link().written_text(), "t\nt\n");
        assert_eq!(s.firmware_version(), Some("espico1.3 R1.3 Jan 10 2024"));
    }

    #[test]
    fn test_firmware_without_response_is_not_fatal() {
        let mut s = session(&["", "tespico1.2\n", "R1.2*\n"]);
        assert!(matches!(
            s.get_firmware_version(false),
            Err(SessionError::NoResponse)
        ));
        assert_eq!(s.state(), SessionState::Busy);
        assert_eq!(s.firmware_version(), None);
    }

    #[test]
    fn test_late_reply_is_not_read_by_next_command() {
        let mut s = session(&["", "tespico1.2\n", "R1.2*\n", "Z!0006\n", "iSN42\n"]);
        assert!(matches!(
            s.get_firmware_version(false),
            Err(SessionError::NoResponse)
        ));
        assert!(matches!(s.get_serial_number(), Err(SessionError::Busy)));
        assert_eq!(s.link().written_text(), "t\n");

        s.abort_and_sync().unwrap();
        assert_eq!(s.state(), SessionState::Connected);
        assert_eq!(s.get_serial_number().unwrap(), "SN42");
    }

    #[test]
    fn test_timeout_on_second_firmware_line_holds_session() {
        let mut s = session(&["tespico1.2\n", "", "R1.2*\n", "Z!0006\n", "vmscr1.2\n"]);
        assert!(matches!(
            s.get_firmware_version(false),
            Err(SessionError::NoResponse)
        ));
        assert!(matches!(s.get_mscript_version(), Err(SessionError::Busy)));
        s.abort_and_sync().unwrap();
        assert_eq!(s.get_mscript_version().unwrap(), "mscr1.2");
    }

    #[test]
    fn test_device_type_detection() {
        let mut s = session(&["tes4_hr1.3\n", "R1.3*\n"]);
        assert_eq!(s.get_device_type(false), DeviceType::EmStat4Hr);
        // cached, no second query
        assert_eq!(s.get_device_type(false), DeviceType::EmStat4Hr);
        assert_eq!(s.link().written_text(), "t\n");
    }

    #[test]
    fn test_device_type_never_fails() {
        let mut s = session(&["tacme9\n", "R9*\n"]);
        assert_eq!(s.get_device_type(false), DeviceType::Unknown);

        let mut s = session(&[]);
        assert_eq!(s.get_device_type(false), DeviceType::Unknown);
    }

    #[test]
    fn test_single_line_queries() {
        let mut s = session(&["vmscr1.2\n", "iES4HR20B0008\n"]);
        assert_eq!(s.get_mscript_version().unwrap(), "mscr1.2");
        assert_eq!(s.get_serial_number().unwrap(), "ES4HR20B0008");
        assert_eq!(s.link().written_text(), "v\ni\n");
    }

    #[test]
    fn test_abort_when_idle_skips_drain() {
        let mut s = session(&["Z!0006\n", "Pba8000000m\n"]);
        let start = Instant::now();
        s.abort_and_sync().unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(s.link().written_text(), "\nZ\n");
        assert_eq!(s.link().pending(), 1);
        assert_eq!(s.state(), SessionState::Connected);
    }

    #[test]
    fn test_abort_running_script_drains_output() {
        let mut s = session(&[
            "Pba8000001m\n",
            "",
            "Z\n",
            "Pba8000002m\n",
            "",
            "+\n",
            "\n",
            "vmscr1.2\n",
        ]);
        s.abort_and_sync().unwrap();
        assert_eq!(s.link().pending(), 1);
        assert_eq!(s.state(), SessionState::Connected);
        assert_eq!(s.get_mscript_version().unwrap(), "mscr1.2");
    }

    #[test]
    fn test_abort_unexpected_response_faults() {
        let mut s = session(&["Z!0004\n"]);
        assert!(matches!(
            s.abort_and_sync(),
            Err(SessionError::Communication(_))
        ));
        assert_eq!(s.state(), SessionState::Error);
    }

    #[test]
    fn test_abort_recovers_from_error_state() {
        let mut s = session(&["Pba8", "Z!0006\n"]);
        assert!(s.readline().is_err());
        assert_eq!(s.state(), SessionState::Error);
        s.abort_and_sync().unwrap();
        assert_eq!(s.state(), SessionState::Connected);
    }

    #[test]
    fn test_run_script_collects_curves() {
        let hub = MetricsHub::new().unwrap();
        let mut s = session(&[
            "e\n",
            "M0000\n",
            "Pda7F0BDC0m;ba8000A00p\n",
            "",
            "Pda7F16B60m;ba8000B00p,10,20B\n",
            "+\n",
            "Pda7F21900m;ba8000C00p\n",
            "*\n",
            "\n",
        ])
        .with_metrics(&hub);
        let m = s.run_script_text("e\nvar p\nmeas_loop_ca p ...\n\n").unwrap();
        assert_eq!(s.state(), SessionState::Connected);
        assert_eq!(m.result.curves.len(), 2);
        assert_eq!(m.result.package_count(), 3);
        assert!(m.finished_at >= m.started_at);
        assert_eq!(hub.protocol.packages_decoded.get(), 3);
        assert_eq!(hub.protocol.read_timeouts.get(), 1);
        assert_eq!(hub.protocol.lines_rx.get(), 8);
    }

    #[test]
    fn test_disconnect_reports_shared_counters() {
        let hub = MetricsHub::new().unwrap();
        let mut s = session(&["", "vmscr1.2\n"]).with_metrics(&hub);
        assert_eq!(s.readline().unwrap(), LineRead::Timeout);
        assert_eq!(s.get_mscript_version().unwrap(), "mscr1.2");
        s.disconnect();
        assert_eq!(s.state(), SessionState::Disconnected);
        let text = hub.to_string();
        assert!(text.contains("mscript_read_timeouts 1"));
        assert!(text.contains("mscript_bytes_tx 2"));
        assert!(text.contains("mscript_lines_rx 1"));
    }

    #[test]
    fn test_unknown_device_json_label() {
        let mut s = session(&["txyz9000\n", "R1.0*\n", "Pba8000001m,201\n", "\n"]);
        assert_eq!(s.get_device_type(false), DeviceType::Unknown);
        let json = s.run_script_text("e\n\n").unwrap().to_json();
        assert_eq!(json["device_type"], "Unknown");
        assert_eq!(json["curves"][0][0][0]["range"], crate::devices::UNKNOWN_RANGE);
    }

    #[test]
    fn test_run_script_rejects_corrupt_package() {
        let mut s = session(&["Pba80000zzm\n", "\n"]);
        assert!(matches!(
            s.run_script_text("e\n\n"),
            Err(SessionError::Parse(_))
        ));
    }

    #[test]
    fn test_measurement_json() {
        let mut s = session(&["tespico1.2\n", "R1.2*\n", "Pba8000001m,11,201\n", "\n"]);
        s.get_device_type(false);
        let m = s.run_script_text("e\n\n").unwrap();
        let json = m.to_json();
        assert_eq!(json["device_type"], "EmStat Pico");
        let var = &json["curves"][0][0][0];
        assert_eq!(var["id"], "ba");
        assert_eq!(var["unit"], "A");
        assert_eq!(var["status"], "TIMING_ERROR");
        assert_eq!(var["range"], "2 uA");
        assert!(json["started_at"].is_string());
    }

    #[test]
    fn test_disconnect() {
        let mut s = session(&["Z!0006\n"]);
        s.disconnect();
        assert_eq!(s.state(), SessionState::Disconnected);
        assert!(s.link().is_closed());
        assert!(matches!(s.write("t\n"), Err(SessionError::NotConnected)));
        assert!(matches!(
            s.abort_and_sync(),
            Err(SessionError::NotConnected)
        ));
    }
}

use prometheus::{Encoder, IntCounter, Registry, TextEncoder};
use std::fmt;

#[derive(Clone)]
pub struct ProtocolMetrics {
    pub lines_rx: IntCounter,
    pub bytes_tx: IntCounter,
    pub read_timeouts: IntCounter,
    pub aborts: IntCounter,
    pub packages_decoded: IntCounter,
}

#[derive(Clone)]
pub struct MetricsHub {
    pub registry: Registry,
    pub protocol: ProtocolMetrics,
}

impl MetricsHub {
    pub fn new() -> Result<Self, String> {
        let counter = |name: &str, help: &str| {
            IntCounter::new(name, help).map_err(|e| format!("metrics init error: {e}"))
        };
        let protocol = ProtocolMetrics {
            lines_rx: counter("mscript_lines_rx", "Total response lines received")?,
            bytes_tx: counter("mscript_bytes_tx", "Total bytes written to the instrument")?,
            read_timeouts: counter("mscript_read_timeouts", "Reads that returned no data")?,
            aborts: counter("mscript_aborts", "Abort-and-sync procedures performed")?,
            packages_decoded: counter("mscript_packages_decoded", "Data packages decoded")?,
        };
        let registry = Registry::new();
        let _ = registry.register(Box::new(protocol.lines_rx.clone()));
        let _ = registry.register(Box::new(protocol.bytes_tx.clone()));
        let _ = registry.register(Box::new(protocol.read_timeouts.clone()));
        let _ = registry.register(Box::new(protocol.aborts.clone()));
        let _ = registry.register(Box::new(protocol.packages_decoded.clone()));
        Ok(Self { registry, protocol })
    }

    /// Prometheus text exposition of every registered counter.
    pub fn encode_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MetricsHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}

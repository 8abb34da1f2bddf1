use std::time::Duration;

/// The only line terminator accepted on the wire.
pub const LINE_TERMINATOR: u8 = b'\n';

/// EmStat Pico default; EmStat4 family instruments negotiate the same rate over USB-CDC.
pub const DEFAULT_BAUD_RATE: u32 = 230_400;

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(1000);

/// Settings used when opening a physical link.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinkSettings {
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

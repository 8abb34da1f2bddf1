use crate::Result;

/// A minimal blocking, line-oriented byte link.
///
/// The link is owned exclusively by one session; implementations need not be `Sync`.
pub trait Link {
    /// Open a link by name (e.g. "/dev/ttyACM0", "COM3").
    fn open(name: &str) -> Result<Self>
    where
        Self: Sized;

    /// Name the link was opened with.
    fn name(&self) -> &str;

    /// Read up to and including the next `\n`, blocking for at most the configured
    /// read timeout.
    ///
    /// Returns whatever arrived before the deadline: a complete line, a partial line
    /// without terminator, or nothing at all. Framing is judged by the caller.
    fn read_line(&mut self) -> Result<Vec<u8>>;

    /// Write all bytes to the link.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Release the underlying resource. Later reads and writes fail with `Closed`.
    fn close(&mut self) -> Result<()>;
}

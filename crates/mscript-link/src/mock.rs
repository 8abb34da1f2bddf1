use crate::{Link, LinkError, Result};
use std::collections::VecDeque;

/// A scripted in-process link. Each instance is independent.
///
/// Every call to [`Link::read_line`] hands back the next queued response chunk
/// verbatim. An empty chunk plays the role of a read timeout. Once the queue is
/// exhausted the link behaves like an unplugged device and reports [`LinkError::Closed`].
pub struct MockLink {
    name: String,
    responses: VecDeque<Vec<u8>>,
    written: Vec<u8>,
    closed: bool,
}

impl MockLink {
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut link = Self {
            name: "mock0".to_string(),
            responses: VecDeque::new(),
            written: Vec::new(),
            closed: false,
        };
        link.push_responses(responses);
        link
    }

    /// Queue more response chunks behind the ones already pending.
    pub fn push_responses<I, S>(&mut self, responses: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.responses
            .extend(responses.into_iter().map(|r| r.as_ref().to_vec()));
    }

    /// Number of response chunks not yet read.
    pub fn pending(&self) -> usize {
        self.responses.len()
    }

    /// Everything written so far, as raw bytes.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Everything written so far, lossily decoded for assertions.
    pub fn written_text(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Link for MockLink {
    fn open(name: &str) -> Result<Self> {
        let mut link = Self::with_responses(Vec::<Vec<u8>>::new());
        link.name = name.to_string();
        Ok(link)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        if self.closed {
            return Err(LinkError::Closed);
        }
        self.responses.pop_front().ok_or(LinkError::Closed)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        if self.closed {
            return Err(LinkError::Closed);
        }
        self.written.extend_from_slice(bytes);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

//! Transmission batching.
//!
//! Bytes are appended tagged as command or data. Consecutive appends with
//! the same tag are merged into one *run*, and every run becomes exactly one
//! bus write on send. For I2C each run opens with a single control byte; for
//! SPI the D/C line is driven once per run instead.
//!
//! A [`Transaction`] mutably borrows its [`Controller`], so only one batch
//! can be pending at a time. Dropping a transaction without sending it
//! discards the pending bytes.
//!
//! ```text
//! command(AE) command(D5 80) data(00 00) command(AF)
//!   I2C → [00 AE D5 80] [40 00 00] [00 AF]      (3 writes)
//!   SPI → DC=0 [AE D5 80] DC=1 [00 00] DC=0 [AF] (3 writes)
//! ```

use heapless::Vec;

use crate::command::{CONTROL_COMMAND, CONTROL_DATA};
use crate::config::MAX_BUFFER_SIZE;
use crate::error::OledError;
use crate::transport::{BusKind, Framing, Transport};

/// Byte capacity of one batch: a full device buffer plus command headroom.
pub const BATCH_CAPACITY: usize = MAX_BUFFER_SIZE + 64;

/// Maximum number of runs in one batch.
pub const MAX_RUNS: usize = 16;

/// Tag of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunKind {
    Command,
    Data,
}

impl RunKind {
    /// I2C control byte that opens a run of this kind.
    pub const fn control_byte(self) -> u8 {
        match self {
            RunKind::Command => CONTROL_COMMAND,
            RunKind::Data => CONTROL_DATA,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RunStart {
    kind: RunKind,
    start: usize,
}

// ── Batch ────────────────────────────────────────────────────────────────

/// Pending runs awaiting a send.
///
/// All runs share one contiguous byte store; the last run is the one that
/// grows on a same-tagged append. If an append does not fit, the batch is
/// marked overflowed and refuses to send.
pub struct Batch {
    framing: Framing,
    bytes: Vec<u8, BATCH_CAPACITY>,
    runs: Vec<RunStart, MAX_RUNS>,
    overflowed: bool,
}

impl Batch {
    /// Create an empty batch for the given framing.
    pub const fn new(framing: Framing) -> Self {
        Self {
            framing,
            bytes: Vec::new(),
            runs: Vec::new(),
            overflowed: false,
        }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Append command bytes.
    pub fn append_command(&mut self, bytes: &[u8]) {
        self.append(RunKind::Command, bytes);
    }

    /// Append display data bytes.
    pub fn append_data(&mut self, bytes: &[u8]) {
        self.append(RunKind::Data, bytes);
    }

    /// Append `bytes` tagged `kind`, opening a new run on a tag change.
    ///
    /// Empty slices are ignored and never open a run.
    pub fn append(&mut self, kind: RunKind, bytes: &[u8]) {
        if bytes.is_empty() || self.overflowed {
            return;
        }

        let opens_run = self.runs.last().map_or(true, |run| run.kind != kind);
        let prefix = usize::from(opens_run && self.framing == Framing::ControlByte);

        let start = self.bytes.len();
        let fits = (prefix == 0 || self.bytes.push(kind.control_byte()).is_ok())
            && self.bytes.extend_from_slice(bytes).is_ok()
            && (!opens_run || self.runs.push(RunStart { kind, start }).is_ok());

        if !fits {
            self.bytes.truncate(start);
            self.overflowed = true;
        }
    }

    /// Discard all pending runs.
    pub fn clear(&mut self) {
        self.bytes.clear();
        self.runs.clear();
        self.overflowed = false;
    }

    /// `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// `true` if an append was rejected for lack of capacity.
    pub fn is_overflowed(&self) -> bool {
        self.overflowed
    }

    /// Number of pending runs (= bus writes on send).
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Pending runs in enqueue order, control bytes included.
    pub fn runs(&self) -> impl Iterator<Item = (RunKind, &[u8])> + '_ {
        self.runs.iter().enumerate().map(move |(i, run)| {
            let end = self
                .runs
                .get(i + 1)
                .map_or(self.bytes.len(), |next| next.start);
            (run.kind, &self.bytes[run.start..end])
        })
    }
}

// ── Controller ───────────────────────────────────────────────────────────

/// A transport paired with its pending batch.
///
/// The batch lives here rather than on the stack so the 1 KiB store is
/// allocated once per display.
pub struct Controller<T> {
    transport: T,
    batch: Batch,
}

impl<T> Controller<T>
where
    T: Transport,
{
    /// Wrap `transport`. The batch framing follows the transport.
    pub fn new(transport: T) -> Self {
        let batch = Batch::new(transport.framing());

        #[cfg(feature = "defmt")]
        defmt::debug!("SSD1306 controller on {} created", transport.kind());

        Self { transport, batch }
    }

    /// The bus this controller drives.
    pub fn bus_kind(&self) -> BusKind {
        self.transport.kind()
    }

    /// Whether the transport reports itself usable.
    pub fn is_ready(&self) -> bool {
        self.transport.is_ready()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Start a new, empty transaction.
    pub fn transaction(&mut self) -> Transaction<'_, T> {
        self.batch.clear();
        Transaction { controller: self }
    }

    /// Send `bytes` as a single command batch.
    pub async fn send_command(&mut self, bytes: &[u8]) -> Result<(), OledError<T::Error>> {
        let mut tx = self.transaction();
        tx.command(bytes);
        tx.send().await
    }

    /// Send `bytes` as a single data batch.
    pub async fn send_data(&mut self, bytes: &[u8]) -> Result<(), OledError<T::Error>> {
        let mut tx = self.transaction();
        tx.data(bytes);
        tx.send().await
    }

    /// Write every pending run, in order, one bus write per run.
    async fn write_pending(&mut self) -> Result<(), OledError<T::Error>> {
        if !self.transport.is_ready() {
            return Err(OledError::Unavailable);
        }
        if self.batch.is_overflowed() {
            return Err(OledError::BatchOverflow);
        }
        if self.batch.is_empty() {
            return Err(OledError::NothingToSend);
        }

        let select_line = self.batch.framing() == Framing::SelectLine;
        for (kind, bytes) in self.batch.runs() {
            if select_line {
                self.transport.select(kind).map_err(OledError::Bus)?;
            }
            self.transport.write(bytes).await.map_err(OledError::Bus)?;
        }
        Ok(())
    }
}

// ── Transaction ──────────────────────────────────────────────────────────

/// Builder for one batch of bus writes.
///
/// ```rust,ignore
/// let mut tx = controller.transaction();
/// tx.command(&[DISPLAY_OFF]).command(&[SET_CONTRAST, 0x7F]);
/// tx.data(&buffer);
/// tx.send().await?; // two writes: one command run, one data run
/// ```
pub struct Transaction<'a, T>
where
    T: Transport,
{
    controller: &'a mut Controller<T>,
}

impl<'a, T> Transaction<'a, T>
where
    T: Transport,
{
    /// Append command bytes.
    pub fn command(&mut self, bytes: &[u8]) -> &mut Self {
        self.controller.batch.append_command(bytes);
        self
    }

    /// Append display data bytes.
    pub fn data(&mut self, bytes: &[u8]) -> &mut Self {
        self.controller.batch.append_data(bytes);
        self
    }

    /// Discard pending bytes, then append command bytes.
    pub fn set_command(&mut self, bytes: &[u8]) -> &mut Self {
        self.reset().command(bytes)
    }

    /// Discard pending bytes, then append display data bytes.
    pub fn set_data(&mut self, bytes: &[u8]) -> &mut Self {
        self.reset().data(bytes)
    }

    /// Discard pending bytes without sending.
    pub fn reset(&mut self) -> &mut Self {
        self.controller.batch.clear();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.controller.batch.is_empty()
    }

    /// Number of bus writes `send()` would perform.
    pub fn run_count(&self) -> usize {
        self.controller.batch.run_count()
    }

    /// Flush all pending runs to the transport.
    ///
    /// Pending state is cleared whether or not the writes succeed; bytes
    /// already on the wire are not rolled back.
    ///
    /// # Errors
    ///
    /// * [`OledError::Unavailable`] if the transport is not ready.
    /// * [`OledError::BatchOverflow`] if an append did not fit.
    /// * [`OledError::NothingToSend`] if nothing was appended.
    /// * [`OledError::Bus`] on the first failed write; later runs are
    ///   skipped.
    ///
    /// The first three perform no bus writes.
    pub async fn send(self) -> Result<(), OledError<T::Error>> {
        let result = self.controller.write_pending().await;

        if let Err(_e) = &result {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "Failed to send batch to {} device: {}",
                self.controller.transport.kind(),
                _e
            );
        }

        // Drop clears the batch.
        result
    }
}

impl<T> Drop for Transaction<'_, T>
where
    T: Transport,
{
    fn drop(&mut self) {
        self.controller.batch.clear();
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

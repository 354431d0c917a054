use std::collections::HashSet;
use std::time::{Duration, SystemTime};

use tracing::debug;

use crate::store::RecordStore;
use crate::validate::{parse_validity_minutes, validate_original_url};
use crate::{
    Batch, Clock, InputRow, RowError, Shortcode, ShortcodeGenerator, TelemetryEvent, TelemetrySink,
    UrlRecord, MAX_EXPIRY_UNIX_SECS,
};

/// How many fresh codes to try before giving up on a unique one.
const MAX_GENERATE_ATTEMPTS: usize = 100;

/// Whether a shortcode may appear on more than one record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShortcodePolicy {
    /// Accept every shortcode as-is, duplicates included.
    #[default]
    AllowDuplicates,
    /// Reject a row whose shortcode is already stored or was accepted
    /// earlier in the same batch.
    RejectDuplicates,
}

impl ShortcodePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "allow" | "allow_duplicates" => Some(ShortcodePolicy::AllowDuplicates),
            "unique" | "reject_duplicates" => Some(ShortcodePolicy::RejectDuplicates),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShortcodePolicy::AllowDuplicates => "allow",
            ShortcodePolicy::RejectDuplicates => "unique",
        }
    }
}

/// Result of evaluating a single form row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowOutcome {
    /// Blank URL; nothing recorded, nothing reported.
    Skipped,
    Rejected(RowError),
    Accepted(UrlRecord),
}

/// Turns submitted batches into accepted records.
///
/// Generic over shortcode generator, clock, and telemetry sink so the whole
/// flow can be driven deterministically in tests. Telemetry is emitted once
/// per non-blank row and never awaited.
pub struct RecordProcessor<G: ShortcodeGenerator, C: Clock, T: TelemetrySink> {
    slugger: G,
    clock: C,
    telemetry: T,
    policy: ShortcodePolicy,
}

impl<G: ShortcodeGenerator, C: Clock, T: TelemetrySink> RecordProcessor<G, C, T> {
    pub fn new(slugger: G, clock: C, telemetry: T) -> Self {
        Self {
            slugger,
            clock,
            telemetry,
            policy: ShortcodePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ShortcodePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ShortcodePolicy {
        self.policy
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Evaluate one row. `index` is 0-based; errors carry the 1-based row.
    ///
    /// `taken` lists shortcodes already in use; it is only consulted under
    /// [`ShortcodePolicy::RejectDuplicates`].
    pub fn evaluate_row(
        &self,
        index: usize,
        row: &InputRow,
        now: SystemTime,
        taken: &HashSet<Shortcode>,
    ) -> RowOutcome {
        let row_no = index + 1;
        if row.is_blank() {
            return RowOutcome::Skipped;
        }

        let Some(original) = validate_original_url(&row.url) else {
            return RowOutcome::Rejected(RowError::InvalidUrl { row: row_no });
        };

        let Some(expiry) = parse_validity_minutes(&row.validity).and_then(|m| expiry_after(now, m))
        else {
            return RowOutcome::Rejected(RowError::InvalidValidity { row: row_no });
        };

        let shortcode = if row.code.is_empty() {
            match self.fresh_shortcode(taken) {
                Some(code) => code,
                None => return RowOutcome::Rejected(RowError::DuplicateShortcode { row: row_no }),
            }
        } else {
            let custom = Shortcode::new(row.code.clone());
            if self.policy == ShortcodePolicy::RejectDuplicates && taken.contains(&custom) {
                return RowOutcome::Rejected(RowError::DuplicateShortcode { row: row_no });
            }
            custom
        };

        RowOutcome::Accepted(UrlRecord::new(original, shortcode, expiry))
    }

    fn fresh_shortcode(&self, taken: &HashSet<Shortcode>) -> Option<Shortcode> {
        if self.policy == ShortcodePolicy::AllowDuplicates {
            return Some(self.slugger.generate());
        }
        // Retry on unlikely collision; hard cap to avoid looping forever.
        (0..MAX_GENERATE_ATTEMPTS)
            .map(|_| self.slugger.generate())
            .find(|code| !taken.contains(code))
    }

    /// Evaluate every row of `batch` in order and return the accepted records.
    ///
    /// The clock is sampled once, so every record in a batch shares the same
    /// submission time. `store` is only read.
    pub fn process(&self, batch: &Batch, store: &RecordStore) -> Vec<UrlRecord> {
        let now = self.clock.now();
        let mut taken: HashSet<Shortcode> = match self.policy {
            ShortcodePolicy::AllowDuplicates => HashSet::new(),
            ShortcodePolicy::RejectDuplicates => {
                store.iter().map(|r| r.shortcode.clone()).collect()
            }
        };

        let mut accepted = Vec::new();
        for (index, row) in batch.rows().iter().enumerate() {
            match self.evaluate_row(index, row, now, &taken) {
                RowOutcome::Skipped => {
                    debug!(row = index + 1, "blank row skipped");
                }
                RowOutcome::Rejected(err) => {
                    debug!(row = err.row(), error = %err, "row rejected");
                    self.telemetry.emit(TelemetryEvent::api_error(err.to_string()));
                }
                RowOutcome::Accepted(record) => {
                    debug!(row = index + 1, shortcode = %record.shortcode, "row accepted");
                    self.telemetry.emit(TelemetryEvent::api_info(format!(
                        "Short URL created: {}",
                        record.shortcode
                    )));
                    if self.policy == ShortcodePolicy::RejectDuplicates {
                        taken.insert(record.shortcode.clone());
                    }
                    accepted.push(record);
                }
            }
        }
        accepted
    }

    /// Pure-function form of a submission: `(store, batch) -> store`.
    pub fn submit(&self, store: RecordStore, batch: &Batch) -> RecordStore {
        let accepted = self.process(batch, &store);
        store.with_appended(accepted)
    }
}

/// `now + minutes`, or `None` when the result falls after
/// [`MAX_EXPIRY_UNIX_SECS`] or cannot be represented at all.
fn expiry_after(now: SystemTime, minutes: u64) -> Option<SystemTime> {
    let secs = minutes.checked_mul(60)?;
    let expiry = now.checked_add(Duration::from_secs(secs))?;
    let latest = SystemTime::UNIX_EPOCH + Duration::from_secs(MAX_EXPIRY_UNIX_SECS);
    (expiry <= latest).then_some(expiry)
}

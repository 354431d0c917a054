//! Domain library for the URL Shortener batch form.
//!
//! Holds the domain types, ports (traits), and error definitions for turning a
//! fixed batch of form rows into short-link records. Only light, pure crates
//! live here (`url` for parsing, `nanoid` for shortcodes); network IO stays in
//! the adapter crates.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Number of rows in a form batch.
pub const BATCH_SIZE: usize = 5;

/// Validity window applied when a row leaves it empty, in minutes.
pub const DEFAULT_VALIDITY_MINUTES: u64 = 30;

/// Latest expiry a record may carry: 9999-12-31T23:59:59Z, in seconds since
/// the Unix epoch. Later timestamps cannot be rendered as calendar dates.
pub const MAX_EXPIRY_UNIX_SECS: u64 = 253_402_300_799;

/// Short identifier of a link. User-supplied codes are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Shortcode(String);

impl Shortcode {
    pub fn new<S: Into<String>>(s: S) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Shortcode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One editable form slot. All fields are raw text as typed by the user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputRow {
    pub url: String,
    pub validity: String,
    pub code: String,
}

impl InputRow {
    pub fn new(url: impl Into<String>, validity: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            validity: validity.into(),
            code: code.into(),
        }
    }

    /// A row with a blank URL is ignored on submission.
    pub fn is_blank(&self) -> bool {
        self.url.trim().is_empty()
    }
}

/// Field selector for [`Batch::set`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowField {
    Url,
    Validity,
    Code,
}

impl RowField {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowField::Url => "url",
            RowField::Validity => "validity",
            RowField::Code => "code",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.to_lowercase().as_str() {
            "url" => Ok(RowField::Url),
            "validity" => Ok(RowField::Validity),
            "code" | "shortcode" => Ok(RowField::Code),
            _ => Err(CoreError::UnknownField(s.to_string())),
        }
    }
}

/// The fixed set of rows submitted together. Always holds exactly
/// [`BATCH_SIZE`] slots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Batch {
    rows: [InputRow; BATCH_SIZE],
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a batch from up to [`BATCH_SIZE`] rows, padding the rest with
    /// empty rows.
    pub fn from_rows<I: IntoIterator<Item = InputRow>>(rows: I) -> Result<Self, CoreError> {
        let given: Vec<InputRow> = rows.into_iter().collect();
        if given.len() > BATCH_SIZE {
            return Err(CoreError::BatchTooLarge(given.len()));
        }
        let mut batch = Self::new();
        for (slot, row) in batch.rows.iter_mut().zip(given) {
            *slot = row;
        }
        Ok(batch)
    }

    /// Replace one field of one slot, leaving every other slot untouched.
    pub fn set(&mut self, index: usize, field: RowField, value: impl Into<String>) -> Result<(), CoreError> {
        let row = self
            .rows
            .get_mut(index)
            .ok_or(CoreError::RowOutOfRange(index))?;
        let value = value.into();
        match field {
            RowField::Url => row.url = value,
            RowField::Validity => row.validity = value,
            RowField::Code => row.code = value,
        }
        Ok(())
    }

    pub fn row(&self, index: usize) -> Option<&InputRow> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[InputRow] {
        &self.rows
    }

    pub fn clear(&mut self) {
        self.rows = Default::default();
    }

    pub fn is_blank(&self) -> bool {
        self.rows.iter().all(InputRow::is_blank)
    }
}

/// An accepted short link. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlRecord {
    /// Lookup key; always equal to `shortcode`.
    pub id: String,
    pub original: String,
    pub shortcode: Shortcode,
    pub expiry: SystemTime,
}

impl UrlRecord {
    pub fn new(original: String, shortcode: Shortcode, expiry: SystemTime) -> Self {
        Self {
            id: shortcode.as_str().to_string(),
            original,
            shortcode,
            expiry,
        }
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        now >= self.expiry
    }
}

/// Origin tag of a telemetry event. The form only ever reports as frontend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stack {
    #[default]
    Frontend,
}

/// Severity of a telemetry event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

/// Subsystem tag of a telemetry event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Package {
    Api,
    Utils,
    Config,
    Middleware,
    Auth,
}

impl Package {
    pub fn as_str(&self) -> &'static str {
        match self {
            Package::Api => "api",
            Package::Utils => "utils",
            Package::Config => "config",
            Package::Middleware => "middleware",
            Package::Auth => "auth",
        }
    }
}

/// A structured, best-effort log message for the remote collector.
///
/// Serializes to exactly `{"stack", "level", "package", "message"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub stack: Stack,
    pub level: Level,
    pub package: Package,
    pub message: String,
}

impl TelemetryEvent {
    pub fn new(level: Level, package: Package, message: impl Into<String>) -> Self {
        Self {
            stack: Stack::Frontend,
            level,
            package,
            message: message.into(),
        }
    }

    pub fn api_error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, Package::Api, message)
    }

    pub fn api_info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, Package::Api, message)
    }
}

/// Time source abstraction to make code testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Source of fresh shortcodes for rows that do not supply one.
pub trait ShortcodeGenerator: Send + Sync {
    fn generate(&self) -> Shortcode;
}

/// Fire-and-forget telemetry port. Implementations must not block the caller
/// and must never report delivery failures back to it.
pub trait TelemetrySink: Send + Sync {
    fn emit(&self, event: TelemetryEvent);
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for &T {
    fn emit(&self, event: TelemetryEvent) {
        (**self).emit(event)
    }
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for std::sync::Arc<T> {
    fn emit(&self, event: TelemetryEvent) {
        (**self).emit(event)
    }
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for Box<T> {
    fn emit(&self, event: TelemetryEvent) {
        (**self).emit(event)
    }
}

/// Why a submitted row produced no record. Rows are numbered from 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowError {
    InvalidUrl { row: usize },
    InvalidValidity { row: usize },
    DuplicateShortcode { row: usize },
}

impl RowError {
    pub fn row(&self) -> usize {
        match self {
            RowError::InvalidUrl { row }
            | RowError::InvalidValidity { row }
            | RowError::DuplicateShortcode { row } => *row,
        }
    }
}

impl Display for RowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RowError::InvalidUrl { row } => write!(f, "Invalid URL at row {}", row),
            RowError::InvalidValidity { row } => write!(f, "Invalid validity at row {}", row),
            RowError::DuplicateShortcode { row } => {
                write!(f, "Shortcode already in use at row {}", row)
            }
        }
    }
}

impl Error for RowError {}

/// Errors from editing a batch.
#[derive(Debug, PartialEq, Eq)]
pub enum CoreError {
    RowOutOfRange(usize),
    BatchTooLarge(usize),
    UnknownField(String),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::RowOutOfRange(i) => {
                write!(f, "row index {} out of range (batch has {} rows)", i, BATCH_SIZE)
            }
            CoreError::BatchTooLarge(n) => {
                write!(f, "batch holds at most {} rows, got {}", BATCH_SIZE, n)
            }
            CoreError::UnknownField(name) => write!(f, "unknown field: {}", name),
        }
    }
}

impl Error for CoreError {}

/// Return a short about/version line for binaries to print.
pub fn about() -> String {
    let pkg = env!("CARGO_PKG_NAME");
    let ver = env!("CARGO_PKG_VERSION");
    format!("{} v{} - record processor loaded", pkg, ver)
}

pub mod adapters;
pub mod processor;
pub mod shortcode;
pub mod store;
pub mod validate;

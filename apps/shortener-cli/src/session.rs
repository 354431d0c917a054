//! Interactive form session: five editable rows plus the accumulated records.

use domain::processor::RecordProcessor;
use domain::store::RecordStore;
use domain::{Batch, Clock, RowField, ShortcodeGenerator, TelemetrySink, UrlRecord, BATCH_SIZE};
use http_common::{build_short_url, minutes_remaining, system_time_to_rfc3339};
use std::time::SystemTime;

pub const HELP: &str = "\
Commands:
  set <row 1-5> <url|validity|code> [value]   edit one field (no value clears it)
  show                                        print the five rows
  submit                                      shorten the current rows
  list                                        print every short link so far
  clear                                       empty all five rows
  help                                        this text
  quit | exit                                 leave the session

Validity is in minutes (default 30). Leave code empty to generate one.";

/// A parsed session command. Row numbers are stored 0-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Set {
        row: usize,
        field: RowField,
        value: String,
    },
    Show,
    Submit,
    List,
    Clear,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let (word, rest) = split_word(line);
        let cmd = match word.to_lowercase().as_str() {
            "" => return Ok(None),
            "set" => {
                let (row_s, rest) = split_word(rest);
                let (field_s, value) = split_word(rest);
                if row_s.is_empty() || field_s.is_empty() {
                    return Err("usage: set <row 1-5> <url|validity|code> [value]".into());
                }
                let row = match row_s.parse::<usize>() {
                    Ok(n) if (1..=BATCH_SIZE).contains(&n) => n - 1,
                    _ => return Err(format!("row must be 1-{}, got '{}'", BATCH_SIZE, row_s)),
                };
                let field = RowField::parse(field_s).map_err(|e| e.to_string())?;
                Command::Set {
                    row,
                    field,
                    value: value.trim().to_string(),
                }
            }
            "show" => Command::Show,
            "submit" | "shorten" => Command::Submit,
            "list" => Command::List,
            "clear" => Command::Clear,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command '{}' (try 'help')", other)),
        };
        Ok(Some(cmd))
    }
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest),
        None => (s, ""),
    }
}

/// One user's form session. Owns the rows and the record store.
pub struct Session<G: ShortcodeGenerator, C: Clock, T: TelemetrySink> {
    batch: Batch,
    store: RecordStore,
    processor: RecordProcessor<G, C, T>,
    shortlink_domain: String,
}

impl<G: ShortcodeGenerator, C: Clock, T: TelemetrySink> Session<G, C, T> {
    pub fn new(processor: RecordProcessor<G, C, T>, shortlink_domain: impl Into<String>) -> Self {
        Self {
            batch: Batch::new(),
            store: RecordStore::new(),
            processor,
            shortlink_domain: shortlink_domain.into(),
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    /// Apply a command and return the lines to print. `Quit` is left to the
    /// caller.
    pub fn handle(&mut self, cmd: Command) -> Vec<String> {
        match cmd {
            Command::Set { row, field, value } => match self.batch.set(row, field, value) {
                Ok(()) => Vec::new(),
                Err(e) => vec![format!("error: {}", e)],
            },
            Command::Show => self.show_rows(),
            Command::Submit => self.submit(),
            Command::List => self.list(),
            Command::Clear => {
                self.batch.clear();
                Vec::new()
            }
            Command::Help => HELP.lines().map(str::to_string).collect(),
            Command::Quit => Vec::new(),
        }
    }

    fn show_rows(&self) -> Vec<String> {
        self.batch
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                format!(
                    "{}. url={:?} validity={:?} code={:?}",
                    i + 1,
                    row.url,
                    row.validity,
                    row.code
                )
            })
            .collect()
    }

    fn submit(&mut self) -> Vec<String> {
        let before = self.store.len();
        let store = std::mem::take(&mut self.store);
        self.store = self.processor.submit(store, &self.batch);

        let now = self.processor.clock().now();
        let created = &self.store.records()[before..];
        if created.is_empty() {
            return vec!["no links created".to_string()];
        }
        created.iter().map(|r| self.render(r, now)).collect()
    }

    fn list(&self) -> Vec<String> {
        if self.store.is_empty() {
            return vec!["no links yet".to_string()];
        }
        let now = self.processor.clock().now();
        self.store.iter().map(|r| self.render(r, now)).collect()
    }

    fn render(&self, rec: &UrlRecord, now: SystemTime) -> String {
        let short = build_short_url(&self.shortlink_domain, rec.shortcode.as_str());
        let expiry = system_time_to_rfc3339(rec.expiry);
        if rec.is_expired(now) {
            format!("{} -> {} (expired at {}) [expired]", short, rec.original, expiry)
        } else {
            format!(
                "{} -> {} (expires at {}, {} min left)",
                short,
                rec.original,
                expiry,
                minutes_remaining(now, rec.expiry)
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::adapters::recording_sink::RecordingSink;
    use domain::shortcode::NanoidGenerator;
    use domain::Level;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone)]
    struct ManualClock(Arc<Mutex<SystemTime>>);
    impl ManualClock {
        fn at(secs: u64) -> Self {
            Self(Arc::new(Mutex::new(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))))
        }
        fn advance(&self, d: Duration) {
            *self.0.lock().unwrap() += d;
        }
    }
    impl Clock for ManualClock {
        fn now(&self) -> SystemTime {
            *self.0.lock().unwrap()
        }
    }

    fn session(
        sink: Arc<RecordingSink>,
        clock: ManualClock,
    ) -> Session<NanoidGenerator, ManualClock, Arc<RecordingSink>> {
        let processor = RecordProcessor::new(NanoidGenerator::default(), clock, sink);
        Session::new(processor, "https://s.example")
    }

    fn run(s: &mut Session<NanoidGenerator, ManualClock, Arc<RecordingSink>>, line: &str) -> Vec<String> {
        let cmd = Command::parse(line).unwrap().unwrap();
        s.handle(cmd)
    }

    #[test]
    fn parse_set_keeps_value_text() {
        let cmd = Command::parse("set 2 url https://example.com/a b").unwrap().unwrap();
        assert_eq!(
            cmd,
            Command::Set {
                row: 1,
                field: RowField::Url,
                value: "https://example.com/a b".into()
            }
        );
        let cleared = Command::parse("set 5 code").unwrap().unwrap();
        assert_eq!(
            cleared,
            Command::Set {
                row: 4,
                field: RowField::Code,
                value: String::new()
            }
        );
    }

    #[test]
    fn parse_errors() {
        assert!(Command::parse("set 0 url x").is_err());
        assert!(Command::parse("set 6 url x").is_err());
        assert!(Command::parse("set 1 colour red").is_err());
        assert!(Command::parse("set").is_err());
        assert!(Command::parse("frobnicate").is_err());
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(Command::parse("EXIT").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn submit_renders_new_links_and_keeps_rows() {
        let sink = Arc::new(RecordingSink::new());
        let mut s = session(sink.clone(), ManualClock::at(1_700_000_000));
        run(&mut s, "set 1 url https://example.com");
        run(&mut s, "set 1 validity 10");
        run(&mut s, "set 1 code mycode");
        run(&mut s, "set 2 url bad");

        let out = run(&mut s, "submit");
        assert_eq!(
            out,
            vec!["https://s.example/mycode -> https://example.com (expires at 2023-11-14T22:23:20Z, 10 min left)"]
        );
        assert_eq!(s.store().len(), 1);
        assert_eq!(s.batch().row(0).unwrap().url, "https://example.com");

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].level, Level::Error);
        assert_eq!(events[1].message, "Invalid URL at row 2");
    }

    #[test]
    fn list_accumulates_and_marks_expired() {
        let clock = ManualClock::at(1_700_000_000);
        let mut s = session(Arc::new(RecordingSink::new()), clock.clone());
        run(&mut s, "set 1 url https://a.com");
        run(&mut s, "set 1 validity 1");
        run(&mut s, "set 1 code first");
        run(&mut s, "submit");
        run(&mut s, "set 1 url https://b.com");
        run(&mut s, "set 1 validity 60");
        run(&mut s, "set 1 code second");
        run(&mut s, "submit");

        clock.advance(Duration::from_secs(120));
        let out = run(&mut s, "list");
        assert_eq!(out.len(), 2);
        assert!(out[0].starts_with("https://s.example/first -> https://a.com"));
        assert!(out[0].ends_with("[expired]"));
        assert!(out[1].starts_with("https://s.example/second -> https://b.com"));
        assert!(out[1].ends_with("58 min left)"));
    }

    #[test]
    fn huge_validity_is_rejected_and_session_survives() {
        let sink = Arc::new(RecordingSink::new());
        let mut s = session(sink.clone(), ManualClock::at(1_700_000_000));
        run(&mut s, "set 1 url https://example.com");
        run(&mut s, "set 1 validity 1000000000000");
        assert_eq!(run(&mut s, "submit"), vec!["no links created"]);
        assert!(s.store().is_empty());
        assert_eq!(sink.events()[0].message, "Invalid validity at row 1");

        run(&mut s, "set 1 validity 5");
        let out = run(&mut s, "submit");
        assert_eq!(out.len(), 1);
        assert_eq!(run(&mut s, "list").len(), 1);
    }

    #[test]
    fn empty_submit_changes_nothing() {
        let sink = Arc::new(RecordingSink::new());
        let mut s = session(sink.clone(), ManualClock::at(0));
        assert_eq!(run(&mut s, "submit"), vec!["no links created"]);
        assert!(s.store().is_empty());
        assert!(sink.is_empty());
        assert_eq!(run(&mut s, "list"), vec!["no links yet"]);
    }

    #[test]
    fn clear_and_show() {
        let mut s = session(Arc::new(RecordingSink::new()), ManualClock::at(0));
        run(&mut s, "set 3 url https://c.com");
        let shown = run(&mut s, "show");
        assert_eq!(shown.len(), BATCH_SIZE);
        assert_eq!(shown[2], "3. url=\"https://c.com\" validity=\"\" code=\"\"");
        run(&mut s, "clear");
        assert!(s.batch().is_blank());
    }
}

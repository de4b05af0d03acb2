/*!
 * Per-run journal.
 *
 * The runner reports record-level events to a `RunJournal` handed to it for
 * the duration of one run: a timestamped log file for real runs, an
 * in-memory list for tests.
 */

use chrono::Local;
use log::Level;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Sink for the events of one run
pub trait RunJournal: Send + Sync {
    fn write(&self, level: Level, message: &str);

    /// Flush and close; called once at the end of the run
    fn finish(&self) {}

    fn info(&self, message: &str) {
        self.write(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.write(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.write(Level::Error, message);
    }
}

/// Appends timestamped lines to a log file
#[derive(Debug)]
pub struct FileJournal {
    run_id: String,
    writer: Mutex<BufWriter<File>>,
}

impl FileJournal {
    /// Open `path` for appending and write the run header
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let journal = Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            writer: Mutex::new(BufWriter::new(file)),
        };
        {
            let mut writer = journal.writer.lock();
            writeln!(
                writer,
                "=== run {} started {} ===",
                journal.run_id,
                Local::now().format("%Y-%m-%d %H:%M:%S")
            )?;
        }
        Ok(journal)
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

impl RunJournal for FileJournal {
    fn write(&self, level: Level, message: &str) {
        let mut writer = self.writer.lock();
        let line = format!(
            "{} [{}] {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            level,
            message
        );
        if let Err(e) = writeln!(writer, "{}", line) {
            log::warn!("Failed to write journal entry: {}", e);
        }
    }

    fn finish(&self) {
        let mut writer = self.writer.lock();
        let footer = writeln!(writer, "=== run {} finished ===", self.run_id);
        if let Err(e) = footer.and_then(|_| writer.flush()) {
            log::warn!("Failed to flush journal: {}", e);
        }
    }
}

/// One captured journal line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
}

/// Keeps entries in memory; clones share the same list
#[derive(Debug, Clone, Default)]
pub struct MemoryJournal {
    entries: Arc<Mutex<Vec<LogEntry>>>,
    finished: Arc<AtomicBool>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn count(&self, level: Level) -> usize {
        self.entries.lock().iter().filter(|e| e.level == level).count()
    }

    /// Whether `finish` has been called
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

impl RunJournal for MemoryJournal {
    fn write(&self, level: Level, message: &str) {
        self.entries.lock().push(LogEntry {
            level,
            message: message.to_string(),
        });
    }

    fn finish(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }
}

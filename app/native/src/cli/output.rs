//! Console output: progress notices, the TTY spinner and result lines.
//!
//! User-facing lines go to stdout; the spinner draws on stderr and only when
//! stderr is a terminal.

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use colored::Colorize;
use parking_lot::Mutex;

use crate::platform::thread::spawn_named_thread;
use crate::policy::{SearchEvent, SearchObserver};

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const CLEAR_LINE: &str = "\x1b[2K\r";
const HIDE_CURSOR: &str = "\x1b[?25l";
const SHOW_CURSOR: &str = "\x1b[?25h";

const FRAME_INTERVAL: Duration = Duration::from_millis(80);

/// Animated "Scoring... i/N (p%)" line driven by a shared counter.
pub struct Spinner {
    done: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    /// Starts the spinner, or returns `None` when stderr is not a terminal.
    #[must_use]
    pub fn start(completed: Arc<AtomicUsize>, total: usize) -> Option<Self> {
        if total == 0 || !io::stderr().is_terminal() {
            return None;
        }

        let done = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&done);

        let handle = spawn_named_thread("progress", move || {
            let mut stderr = io::stderr();
            let _ = write!(stderr, "{HIDE_CURSOR}");

            let mut frame = 0;
            while !stop.load(Ordering::Relaxed) {
                let finished = completed.load(Ordering::Relaxed).min(total);
                let percent = finished * 100 / total;
                let spinner = SPINNER_FRAMES[frame % SPINNER_FRAMES.len()];
                let line = format!("{spinner} Scoring... {finished}/{total} ({percent}%)");
                let _ = write!(stderr, "{CLEAR_LINE}{}", line.cyan());
                let _ = stderr.flush();

                frame += 1;
                std::thread::sleep(FRAME_INTERVAL);
            }

            let _ = write!(stderr, "{CLEAR_LINE}{SHOW_CURSOR}");
            let _ = stderr.flush();
        })?;

        Some(Self { done, handle: Some(handle) })
    }

    /// Stops the animation and clears its line.
    pub fn stop(mut self) { self.finish(); }

    fn finish(&mut self) {
        self.done.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) { self.finish(); }
}

/// Prints a warning notice on stderr.
pub fn warn(message: &str) { eprintln!("{} {message}", "warning:".yellow().bold()); }

/// Local result line: `file: "<path>", distance: <d.dd>`.
#[must_use]
pub fn file_result_line(path: &str, distance: f64) -> String {
    format!("file: {path:?}, distance: {distance:.2}")
}

/// Notices for directory mode, plus the spinner over the scoring batch.
pub struct DirObserver {
    progress: Arc<AtomicUsize>,
    spinner: Mutex<Option<Spinner>>,
}

impl DirObserver {
    #[must_use]
    pub fn new(progress: Arc<AtomicUsize>) -> Self { Self { progress, spinner: Mutex::new(None) } }

    /// Stops the spinner if it is running.
    pub fn finish(&self) {
        if let Some(spinner) = self.spinner.lock().take() {
            spinner.stop();
        }
    }
}

impl SearchObserver for DirObserver {
    fn on_event(&self, event: &SearchEvent) {
        if let SearchEvent::FirstBatch { size, target: Some(target) } = event {
            tracing::info!(files = size, "processing files");
            println!("Searching image closest to the color {}.", target.to_hex().bold());
            *self.spinner.lock() = Spinner::start(Arc::clone(&self.progress), *size);
        }
    }
}

/// Notices for remote mode, printed as the pages are scanned.
#[derive(Debug, Default)]
pub struct RemoteObserver;

impl RemoteObserver {
    /// Text printed for an event, if any.
    #[must_use]
    pub fn message(event: &SearchEvent) -> Option<String> {
        match event {
            SearchEvent::FirstBatch { size, target: Some(target) } => Some(format!(
                "Picking a thumb out of {size} which has average color closest to {}...",
                target.to_hex()
            )),
            SearchEvent::FirstBatch { size, target: None } => {
                Some(format!("Picking first thumb out of {size}."))
            }
            SearchEvent::Advance { distance, threshold, next_page, total_pages } => {
                let of = total_pages.map_or_else(|| "?".to_string(), |total| total.to_string());
                Some(format!("{distance:.2} > {threshold:.2} go to page {next_page} of {of}"))
            }
            SearchEvent::Fallback => {
                Some("Could not find appropriate thumb, picking the closest one".to_string())
            }
        }
    }
}

impl SearchObserver for RemoteObserver {
    fn on_event(&self, event: &SearchEvent) {
        if let Some(message) = Self::message(event) {
            println!("{message}");
        }
    }
}

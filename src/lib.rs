pub mod cancel;
pub mod date;
pub mod media;
pub mod touch;
pub mod walk;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub use cancel::{CancellationToken, CancelledError};
pub use date::{extract_date, extract_date_at, normalize_digits, DateGuess};
pub use media::ExtensionFilter;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreOptions {
    /// Folder to walk recursively
    pub root: PathBuf,
    /// Log what would change without touching any file
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub filter: ExtensionFilter,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RestoreReport {
    /// Files handed to the extractor
    pub total_files: u64,
    /// Files whose name yielded a date
    pub recognized: u64,
    /// Files whose timestamps were actually changed
    pub updated: u64,
    /// Files with a date that could not be applied
    pub failed: u64,
    /// Files rejected by the extension filter
    pub skipped: u64,
    /// Files left untouched because no pattern matched
    pub unrecognized: Vec<PathBuf>,
    pub elapsed_secs: f64,
}

/// Control options for a restore run (cancellation, clock).
#[derive(Debug, Clone, Default)]
pub struct RestoreControl {
    pub cancel_token: Option<CancellationToken>,
    /// Upper bound for epoch timestamps; the local clock at start when unset
    pub now: Option<NaiveDateTime>,
}

impl RestoreControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }
}

/// Type alias for progress callback: (current, total, message)
pub type ProgressCallback<'a> = dyn Fn(u64, u64, &str) + Send + Sync + 'a;

/// Throttled progress reporter, emits at most every 200ms or on completion.
pub struct ThrottledProgress<'a> {
    inner: &'a ProgressCallback<'a>,
    last_emit: Mutex<Instant>,
}

impl<'a> ThrottledProgress<'a> {
    pub fn new(inner: &'a ProgressCallback<'a>) -> Self {
        Self {
            inner,
            last_emit: Mutex::new(Instant::now() - Duration::from_secs(1)),
        }
    }

    pub fn report(&self, current: u64, total: u64, message: &str) {
        let is_done = current + 1 >= total;
        if !is_done {
            let Ok(mut last) = self.last_emit.lock() else {
                return;
            };
            if last.elapsed().as_millis() < 200 {
                return;
            }
            *last = Instant::now();
        }
        (self.inner)(current, total, message);
    }
}

enum Outcome {
    Updated,
    Simulated,
    Unrecognized,
    Failed,
    Cancelled,
}

/// Walk `options.root` and set each file's timestamps from the date in its name.
pub fn restore_dates(
    options: &RestoreOptions,
    control: &RestoreControl,
    progress_callback: &ProgressCallback<'_>,
) -> anyhow::Result<RestoreReport> {
    let start = Instant::now();
    if !options.root.is_dir() {
        anyhow::bail!("{} is not a valid directory", options.root.display());
    }
    if let Some(ref token) = control.cancel_token {
        token.check()?;
    }

    tracing::info!("Starting file processing in: {}", options.root.display());
    let walk = walk::collect_files(&options.root, &options.filter);
    let total = walk.files.len() as u64;
    let now = control.now.unwrap_or_else(|| Local::now().naive_local());

    let tp = ThrottledProgress::new(progress_callback);
    let counter = AtomicU64::new(0);

    let outcomes: Vec<Outcome> = walk
        .files
        .par_iter()
        .map(|path| {
            if control.cancel_token.as_ref().is_some_and(|t| t.is_cancelled()) {
                return Outcome::Cancelled;
            }
            let outcome = restore_file(path, options.dry_run, now);
            let current = counter.fetch_add(1, Ordering::Relaxed);
            tp.report(current, total, "restoring dates");
            outcome
        })
        .collect();

    if outcomes.iter().any(|o| matches!(o, Outcome::Cancelled)) {
        return Err(CancelledError.into());
    }

    let mut report = RestoreReport {
        total_files: total,
        skipped: walk.skipped,
        ..Default::default()
    };
    for (path, outcome) in walk.files.into_iter().zip(outcomes) {
        match outcome {
            Outcome::Updated => {
                report.recognized += 1;
                report.updated += 1;
            }
            Outcome::Simulated => report.recognized += 1,
            Outcome::Failed => {
                report.recognized += 1;
                report.failed += 1;
            }
            Outcome::Unrecognized => report.unrecognized.push(path),
            Outcome::Cancelled => {}
        }
    }
    report.elapsed_secs = start.elapsed().as_secs_f64();
    Ok(report)
}

fn restore_file(path: &Path, dry_run: bool, now: NaiveDateTime) -> Outcome {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();

    let Some(guess) = extract_date_at(&filename, now) else {
        tracing::debug!("{} => pattern not recognized, date unchanged", path.display());
        return Outcome::Unrecognized;
    };

    if dry_run {
        tracing::info!("[SIMULATION] {} => {} ({})", path.display(), guess.date, guess.explanation);
        return Outcome::Simulated;
    }

    match touch::set_file_date(path, &guess.date) {
        Ok(()) => {
            tracing::info!("{} => {} ({})", path.display(), guess.date, guess.explanation);
            tracing::debug!("{} matched rule {}", path.display(), guess.rule);
            Outcome::Updated
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            Outcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use filetime::FileTime;
    use std::fs::{self, File};
    use std::sync::atomic::AtomicBool;
    use tempfile::tempdir;

    fn ignore(_: u64, _: u64, _: &str) {}

    fn control() -> RestoreControl {
        let now = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        RestoreControl::new().with_now(now)
    }

    fn mtime(path: &Path) -> FileTime {
        FileTime::from_last_modification_time(&fs::metadata(path).unwrap())
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("whatsapp")).unwrap();
        for name in [
            "20181128_110755.jpg",
            "whatsapp/IMG-20181225-WA0014.jpg",
            "whatsapp/WhatsApp Image 2018-11-27 at 18.41.02.png",
            "random_photo.jpg",
            "notes.txt",
        ] {
            File::create(dir.path().join(name)).unwrap();
        }
        dir
    }

    #[test]
    fn test_restore_sets_mtime() {
        let dir = fixture();
        let options = RestoreOptions {
            root: dir.path().to_path_buf(),
            dry_run: false,
            filter: ExtensionFilter::MediaOnly,
        };
        let report = restore_dates(&options, &control(), &ignore).unwrap();

        assert_eq!(report.total_files, 4);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.recognized, 3);
        assert_eq!(report.updated, 3);
        assert_eq!(report.failed, 0);
        assert_eq!(report.unrecognized, vec![dir.path().join("random_photo.jpg")]);

        let date = NaiveDate::from_ymd_opt(2018, 11, 28).unwrap().and_hms_opt(11, 7, 55).unwrap();
        let expected = touch::local_file_time(&date).unwrap();
        assert_eq!(mtime(&dir.path().join("20181128_110755.jpg")), expected);
    }

    #[test]
    fn test_dry_run_leaves_files() {
        let dir = fixture();
        let path = dir.path().join("20181128_110755.jpg");
        let before = mtime(&path);

        let options = RestoreOptions {
            root: dir.path().to_path_buf(),
            dry_run: true,
            filter: ExtensionFilter::Any,
        };
        let report = restore_dates(&options, &control(), &ignore).unwrap();

        assert_eq!(report.total_files, 5);
        assert_eq!(report.recognized, 3);
        assert_eq!(report.updated, 0);
        assert_eq!(report.unrecognized.len(), 2);
        assert_eq!(mtime(&path), before);
    }

    #[test]
    fn test_invalid_root() {
        let dir = tempdir().unwrap();
        let options = RestoreOptions {
            root: dir.path().join("missing"),
            dry_run: true,
            filter: ExtensionFilter::Any,
        };
        assert!(restore_dates(&options, &control(), &ignore).is_err());
    }

    #[test]
    fn test_cancelled_run() {
        let dir = fixture();
        let token = CancellationToken::new();
        token.cancel();
        let options = RestoreOptions {
            root: dir.path().to_path_buf(),
            dry_run: false,
            filter: ExtensionFilter::Any,
        };
        let err = restore_dates(&options, &control().with_cancel_token(token), &ignore).unwrap_err();
        assert!(err.downcast_ref::<CancelledError>().is_some());
    }

    #[test]
    fn test_progress_reports_completion() {
        let dir = fixture();
        let finished = AtomicBool::new(false);
        let callback = |current: u64, total: u64, _: &str| {
            if current + 1 == total {
                finished.store(true, Ordering::SeqCst);
            }
        };
        let options = RestoreOptions {
            root: dir.path().to_path_buf(),
            dry_run: true,
            filter: ExtensionFilter::Any,
        };
        restore_dates(&options, &control(), &callback).unwrap();
        assert!(finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_progress_borrows_local_state() {
        let dir = fixture();
        let seen = Mutex::new(Vec::new());
        let options = RestoreOptions {
            root: dir.path().to_path_buf(),
            dry_run: true,
            filter: ExtensionFilter::Any,
        };
        restore_dates(&options, &control(), &|current, total, message| {
            seen.lock().unwrap().push((current, total, message.to_string()));
        })
        .unwrap();
        let seen = seen.into_inner().unwrap();
        assert!(seen.iter().any(|(current, total, _)| current + 1 == *total && *total == 5));
        assert!(seen.iter().all(|(_, _, message)| message == "restoring dates"));
    }

    #[test]
    fn test_options_from_json() {
        let options: RestoreOptions = serde_json::from_str(r#"{"root": "/photos"}"#).unwrap();
        assert_eq!(options.root, PathBuf::from("/photos"));
        assert!(!options.dry_run);
        assert_eq!(options.filter, ExtensionFilter::Any);
    }
}

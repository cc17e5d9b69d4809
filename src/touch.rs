use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDateTime, Offset, TimeZone};
use filetime::FileTime;

/// Pin a naive date to an instant in `tz`. Ambiguous times (DST fall-back)
/// resolve to the earlier instant. Times skipped by a spring-forward change
/// are moved forward by the length of the gap, so 02:30 becomes 03:30.
pub fn resolve_local<Tz: TimeZone>(date: &NaiveDateTime, tz: &Tz) -> Option<DateTime<Tz>> {
    if let Some(dt) = tz.from_local_datetime(date).earliest() {
        return Some(dt);
    }
    let before = tz.offset_from_local_datetime(&(*date - Duration::days(1))).earliest()?.fix();
    let after = tz.offset_from_local_datetime(&(*date + Duration::days(1))).earliest()?.fix();
    let gap = i64::from(after.local_minus_utc() - before.local_minus_utc());
    tz.from_local_datetime(&(*date + Duration::seconds(gap))).earliest()
}

/// Convert a naive local date to a file time.
pub fn local_file_time(date: &NaiveDateTime) -> anyhow::Result<FileTime> {
    let local = resolve_local(date, &chrono::Local)
        .with_context(|| format!("{} does not exist in the local time zone", date))?;
    Ok(FileTime::from_unix_time(local.timestamp(), 0))
}

/// Set access and modification time of `path` to `date`.
pub fn set_file_date(path: &Path, date: &NaiveDateTime) -> anyhow::Result<()> {
    let ft = local_file_time(date)?;
    filetime::set_file_times(path, ft, ft)
        .with_context(|| format!("Error changing date of {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn test_set_file_date() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("20181128_110755.jpg");
        File::create(&path).unwrap();

        let date = NaiveDate::from_ymd_opt(2018, 11, 28).unwrap().and_hms_opt(11, 7, 55).unwrap();
        set_file_date(&path, &date).unwrap();

        let meta = fs::metadata(&path).unwrap();
        let mtime = FileTime::from_last_modification_time(&meta);
        assert_eq!(mtime, local_file_time(&date).unwrap());
        let atime = FileTime::from_last_access_time(&meta);
        assert_eq!(atime.unix_seconds(), mtime.unix_seconds());
    }

    fn naive(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, 0).unwrap()
    }

    #[test]
    fn test_resolve_spring_forward_gap() {
        let tz = chrono_tz::Europe::Amsterdam;
        // 02:00 -> 03:00 on 2021-03-28, 02:30 never happens
        let dt = resolve_local(&naive(2021, 3, 28, 2, 30), &tz).unwrap();
        assert_eq!(dt.naive_local(), naive(2021, 3, 28, 3, 30));
        assert_eq!(dt.naive_utc(), naive(2021, 3, 28, 1, 30));
    }

    #[test]
    fn test_resolve_fall_back_ambiguity() {
        let tz = chrono_tz::Europe::Amsterdam;
        // 02:30 happens twice on 2021-10-31, the CEST one comes first
        let dt = resolve_local(&naive(2021, 10, 31, 2, 30), &tz).unwrap();
        assert_eq!(dt.naive_utc(), naive(2021, 10, 31, 0, 30));
    }

    #[test]
    fn test_resolve_regular_time() {
        let tz = chrono_tz::Europe::Amsterdam;
        let dt = resolve_local(&naive(2021, 7, 1, 12, 0), &tz).unwrap();
        assert_eq!(dt.naive_utc(), naive(2021, 7, 1, 10, 0));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert!(set_file_date(&dir.path().join("gone.jpg"), &date).is_err());
    }
}

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::DateGuess;

/// Extensions accepted for a name that is nothing but an epoch timestamp
const EPOCH_EXTENSIONS: &str = "jpg|jpeg|png|mp4|mov|gif|bmp|tif|tiff|webm|avi|mkv";

static RE_COMPACT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9]{8})_([0-9]{6})").unwrap());
static RE_DOTTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{4})-([0-9]{2})-([0-9]{2}) ([0-9]{2})\.([0-9]{2})\.([0-9]{2})").unwrap()
});
static RE_ISO_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9]{4})-([0-9]{2})-([0-9]{2})").unwrap());
static RE_AT_TIME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"at ([0-9]{2})\.([0-9]{2})\.([0-9]{2})").unwrap());
static RE_TAGGED_EPOCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:FB_IMG_|IMG_)([0-9]{9,13})(?:[._]|$)").unwrap());
static RE_BARE_EPOCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)^([0-9]{{9,13}})\.(?:{EPOCH_EXTENSIONS})$")).unwrap());
static RE_SCREENSHOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Screenshot_([0-9]{8})-([0-9]{6})").unwrap());
static RE_WA_VIDEO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"VID-([0-9]{8})-WA").unwrap());
static RE_WA_IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"IMG-([0-9]{8})-WA").unwrap());
static RE_PHOTO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Photo_([0-9]{8})_([0-9]{6})").unwrap());
static RE_JPEG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"JPEG_([0-9]{8})_([0-9]{6})").unwrap());
static RE_VIDEO_CAPTURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"VideoCapture_([0-9]{8})-([0-9]{6})").unwrap());
static RE_EPOCH_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([0-9]{13})-").unwrap());
static RE_PICSART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Picsart_([0-9]{2})-([0-9]{2})-([0-9]{2})_([0-9]{2})-([0-9]{2})-([0-9]{2})").unwrap()
});
static RE_CAMSCANNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"CamScanner ([0-9]{2})-([0-9]{2})-([0-9]{4}) ([0-9]{2})\.([0-9]{2})").unwrap()
});

/// What a rule sees of the current extraction.
pub struct Scan<'a> {
    /// File name after digit normalization
    pub name: &'a str,
    /// Upper bound for epoch timestamps
    pub now: NaiveDateTime,
}

type Build = fn(&Captures, &Scan) -> Option<(NaiveDateTime, String)>;

/// One naming convention: the patterns that recognize it and how the
/// captured digits become a date. The first pattern that matches is used.
pub struct Rule {
    name: &'static str,
    patterns: &'static [&'static LazyLock<Regex>],
    build: Build,
}

impl Rule {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `None` when no pattern matches or the digits do not form a valid date.
    pub fn apply(&self, scan: &Scan) -> Option<DateGuess> {
        let caps = self.patterns.iter().find_map(|re| re.captures(scan.name))?;
        let (date, explanation) = (self.build)(&caps, scan)?;
        Some(DateGuess {
            date,
            explanation,
            rule: self.name,
        })
    }
}

/// Recognizers in precedence order. The first one producing a valid date wins.
pub static RULES: &[Rule] = &[
    // 20181128_110755.jpg, IMG_20180507_192217158.jpg
    Rule { name: "compact-camera", patterns: &[&RE_COMPACT], build: date_time_pair },
    // 2020-01-01 12.30.59.jpg, must run before the date-only rule below
    Rule { name: "dotted-date-time", patterns: &[&RE_DOTTED], build: dotted_date_time },
    // WhatsApp Image 2018-11-27 at 18.41.02.png, WhatsApp Video 2020-05-15.mp4
    Rule { name: "whatsapp-date", patterns: &[&RE_ISO_DATE], build: iso_date_optional_time },
    // FB_IMG_1545742864733.jpg, 1577836800.jpg
    Rule { name: "unix-timestamp", patterns: &[&RE_TAGGED_EPOCH, &RE_BARE_EPOCH], build: epoch_digits },
    // Screenshot_20200101-151016_Calendar.jpg
    Rule { name: "screenshot", patterns: &[&RE_SCREENSHOT], build: date_time_pair },
    // VID-20200615-WA0127.mp4
    Rule { name: "whatsapp-video", patterns: &[&RE_WA_VIDEO], build: date_at_midnight },
    // IMG-20181225-WA0014.jpg
    Rule { name: "whatsapp-image", patterns: &[&RE_WA_IMAGE], build: date_at_midnight },
    // Photo_20200101_123059.jpg
    Rule { name: "android-photo", patterns: &[&RE_PHOTO], build: date_time_pair },
    // JPEG_20200722_183656.jpg
    Rule { name: "smartphone-jpeg", patterns: &[&RE_JPEG], build: date_time_pair },
    // VideoCapture_20210312-184512.mp4
    Rule { name: "video-capture", patterns: &[&RE_VIDEO_CAPTURE], build: date_time_pair },
    // 1531699202381-edited.jpg
    Rule { name: "timestamp-suffix", patterns: &[&RE_EPOCH_SUFFIX], build: epoch_digits },
    // Picsart_22-03-14_10-20-30-123.jpg
    Rule { name: "picsart", patterns: &[&RE_PICSART], build: picsart },
    // CamScanner 03-14-2022 10.20.jpg
    Rule { name: "camscanner", patterns: &[&RE_CAMSCANNER], build: camscanner },
];

fn date_time_pair(caps: &Captures, _: &Scan) -> Option<(NaiveDateTime, String)> {
    calendar(&caps[1], &caps[2])
}

fn date_at_midnight(caps: &Captures, _: &Scan) -> Option<(NaiveDateTime, String)> {
    calendar(&caps[1], "000000")
}

fn dotted_date_time(caps: &Captures, _: &Scan) -> Option<(NaiveDateTime, String)> {
    let date = format!("{}{}{}", &caps[1], &caps[2], &caps[3]);
    let time = format!("{}{}{}", &caps[4], &caps[5], &caps[6]);
    calendar(&date, &time)
}

fn iso_date_optional_time(caps: &Captures, scan: &Scan) -> Option<(NaiveDateTime, String)> {
    let date = format!("{}{}{}", &caps[1], &caps[2], &caps[3]);
    // The time is searched for anywhere in the name, not next to the date
    let time = match RE_AT_TIME.captures(scan.name) {
        Some(t) => format!("{}{}{}", &t[1], &t[2], &t[3]),
        None => "000000".to_string(),
    };
    calendar(&date, &time)
}

fn picsart(caps: &Captures, _: &Scan) -> Option<(NaiveDateTime, String)> {
    // Picsart only ever wrote two-digit years after 2000
    let date = format!("20{}{}{}", &caps[1], &caps[2], &caps[3]);
    let time = format!("{}{}{}", &caps[4], &caps[5], &caps[6]);
    calendar(&date, &time)
}

fn camscanner(caps: &Captures, _: &Scan) -> Option<(NaiveDateTime, String)> {
    let date = format!("{}{}{}", &caps[3], &caps[1], &caps[2]);
    let time = format!("{}{}00", &caps[4], &caps[5]);
    calendar(&date, &time)
}

fn epoch_digits(caps: &Captures, scan: &Scan) -> Option<(NaiveDateTime, String)> {
    epoch(&caps[1], scan.now)
}

/// Build a date from `YYYYMMDD` and `HHMMSS` digit strings.
fn calendar(date: &str, time: &str) -> Option<(NaiveDateTime, String)> {
    let year = field(date, 0, 4)?;
    if !(1..=9999).contains(&year) {
        return None;
    }
    let dt = NaiveDate::from_ymd_opt(year as i32, field(date, 4, 6)?, field(date, 6, 8)?)?
        .and_hms_opt(field(time, 0, 2)?, field(time, 2, 4)?, field(time, 4, 6)?)?;
    Some((dt, format!("{} {}", date, time)))
}

fn field(digits: &str, start: usize, end: usize) -> Option<u32> {
    digits.get(start..end)?.parse().ok()
}

/// Seconds since the epoch, or milliseconds when 13 digits long, as local
/// time. Rejected unless it falls between 1970-01-01 00:00:00 and `now`.
fn epoch(digits: &str, now: NaiveDateTime) -> Option<(NaiveDateTime, String)> {
    let secs_digits = if digits.len() == 13 { &digits[..10] } else { digits };
    let secs: i64 = secs_digits.parse().ok()?;
    let date = DateTime::from_timestamp(secs, 0)?.with_timezone(&Local).naive_local();
    let unix_epoch = DateTime::from_timestamp(0, 0)?.naive_utc();
    if date < unix_epoch || date > now {
        return None;
    }
    Some((date, format!("timestamp {}", secs)))
}

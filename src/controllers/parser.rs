use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::lyrics::Verse;

/// Gap (seconds) between consecutive lines that starts a new verse.
pub const VERSE_GAP_THRESHOLD: f64 = 8.0;

static TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(\d+):(\d{2})(?:\.(\d{1,3}))?\]").unwrap());

/// Extract the timestamp (in seconds) from a line like `[01:02.38]text`.
pub fn extract_time(line: &str) -> Option<f64> {
    let caps = TIMESTAMP_RE.captures(line)?;
    let minutes: f64 = caps.get(1)?.as_str().parse().ok()?;
    let seconds: f64 = caps.get(2)?.as_str().parse().ok()?;
    let fraction = match caps.get(3) {
        Some(m) => {
            let digits = m.as_str();
            let value: f64 = digits.parse().ok()?;
            value / 10f64.powi(digits.len() as i32)
        }
        None => 0.0,
    };
    Some(minutes * 60.0 + seconds + fraction)
}

fn strip_timestamp(line: &str) -> String {
    TIMESTAMP_RE.replace(line, "").trim().to_string()
}

/// Detect verse start times from timestamped (LRC) lyric lines.
///
/// A verse opens at the first timestamped line, whenever the gap since the
/// previous line exceeds `gap_threshold`, or on a `♪` marker line. Lines
/// without a timestamp are skipped.
pub fn detect_verses(lines: &[String], gap_threshold: f64) -> Vec<Verse> {
    let mut verses = Vec::new();
    let mut prev_time: Option<f64> = None;

    for (i, line) in lines.iter().enumerate() {
        let time = match extract_time(line) {
            Some(t) => t,
            None => continue,
        };
        let text = strip_timestamp(line);

        let opens_verse = match prev_time {
            None => true,
            Some(prev) => time - prev > gap_threshold || text.contains('♪'),
        };
        if opens_verse {
            verses.push(Verse {
                index: i,
                start_time: (time * 100.0).round() / 100.0,
                first_line: text,
            });
        }
        prev_time = Some(time);
    }

    verses
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn extracts_time_with_fraction() {
        assert_eq!(extract_time("[01:02.38]text"), Some(62.38));
    }

    #[test]
    fn extracts_time_without_fraction() {
        assert_eq!(extract_time("[02:10]text"), Some(130.0));
    }

    #[test]
    fn fraction_scales_by_digit_count() {
        // one fractional digit is tenths, three are thousandths
        assert_eq!(extract_time("[00:01.5]x"), Some(1.5));
        assert_eq!(extract_time("[00:01.500]x"), Some(1.5));
    }

    #[test]
    fn rejects_lines_without_timestamp() {
        assert_eq!(extract_time("no timestamp here"), None);
        assert_eq!(extract_time("[badly:formed]"), None);
    }

    #[test]
    fn first_timestamped_line_opens_first_verse() {
        let data = lines(&["[00:33.71]Pee loon tere neele-neele nainon se shabnam"]);
        let verses = detect_verses(&data, VERSE_GAP_THRESHOLD);
        assert_eq!(verses.len(), 1);
        assert_eq!(verses[0].index, 0);
        assert_eq!(verses[0].start_time, 33.71);
        assert_eq!(
            verses[0].first_line,
            "Pee loon tere neele-neele nainon se shabnam"
        );
    }

    #[test]
    fn gap_over_threshold_opens_new_verse() {
        let data = lines(&[
            "[00:10.00]first verse line one",
            "[00:14.00]first verse line two",
            "[00:30.00]second verse",
        ]);
        let verses = detect_verses(&data, VERSE_GAP_THRESHOLD);
        assert_eq!(verses.len(), 2);
        assert_eq!(verses[1].index, 2);
        assert_eq!(verses[1].start_time, 30.0);
    }

    #[test]
    fn instrumental_marker_opens_new_verse() {
        let data = lines(&[
            "[00:10.00]line",
            "[00:12.00]♪",
            "[00:14.00]after the break",
        ]);
        let verses = detect_verses(&data, VERSE_GAP_THRESHOLD);
        assert_eq!(verses.len(), 2);
        assert_eq!(verses[1].first_line, "♪");
    }

    #[test]
    fn untimestamped_lines_are_skipped() {
        let data = lines(&["credits: someone", "[00:10.00]real line"]);
        let verses = detect_verses(&data, VERSE_GAP_THRESHOLD);
        assert_eq!(verses.len(), 1);
        assert_eq!(verses[0].index, 1);
    }

    #[test]
    fn detects_verses_in_full_song() {
        let data = lines(&[
            "[00:33.71]Pee loon tere neele-neele nainon se shabnam",
            "[00:39.47]Pee loon tere geele-geele honthon ki sargam",
            "[00:55.57]Qurbaan, meherbaan, ke main toh qurbaan",
            "[01:03.08]Hosh mein rahoon kyun aaj main?",
            "[01:59.17]Tu mere seene mein chhupti hai",
            "[02:45.35]♪",
            "[03:14.45]Shaam ko miloon jo main tujhe",
        ]);
        let verses = detect_verses(&data, VERSE_GAP_THRESHOLD);
        let starts: Vec<usize> = verses.iter().map(|v| v.index).collect();
        assert_eq!(starts, vec![0, 2, 4, 5, 6]);
    }
}

// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

use std::fmt;
use chrono::{DateTime, TimeZone};
use bpf_swapin::COMM_LEN;
use super::Entry;

/// One output cycle: optional timestamp, header, rows ascending by count and a blank line.
pub struct Report {
    time: Option<String>,
    entries: Vec<Entry>,
}

impl Report {
    /// Sorting is stable, equal counts keep the order of `entries`.
    pub fn new(mut entries: Vec<Entry>) -> Self {
        entries.sort_by_key(|&(_, count)| count);
        Report { time: None, entries }
    }

    pub fn with_time<Tz>(self, time: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Report {
            time: Some(time.format("%H:%M:%S").to_string()),
            ..self
        }
    }

    #[cfg(test)]
    fn entries(&self) -> &[Entry] {
        &self.entries
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(time) = &self.time {
            writeln!(f, "{}", time)?;
        }
        writeln!(f, "{:<16} {:<7} {}", "COMM", "PID", "COUNT")?;
        for (key, count) in &self.entries {
            let comm = String::from_utf8_lossy(key.comm());
            writeln!(f, "{:<16.w$} {:<7} {}", comm, key.pid, count, w = COMM_LEN)?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use bpf_swapin::CounterKey;
    use super::Report;

    #[test]
    fn ascending_and_stable() {
        let report = Report::new(vec![
            (CounterKey::new(1, "a"), 5),
            (CounterKey::new(2, "b"), 1),
            (CounterKey::new(3, "c"), 5),
            (CounterKey::new(4, "d"), 1),
            (CounterKey::new(5, "e"), 3),
        ]);
        let pids = report.entries().iter().map(|(k, _)| k.pid).collect::<Vec<_>>();
        assert_eq!(pids, vec![2, 4, 5, 1, 3]);
    }

    #[test]
    fn layout() {
        let report = Report::new(vec![
            (CounterKey::new(100, "bash"), 3),
            (CounterKey::new(200, "java"), 1),
        ]);
        assert_eq!(
            report.to_string(),
            "COMM             PID     COUNT\n\
             java             200     1\n\
             bash             100     3\n\
             \n",
        );
    }

    #[test]
    fn timestamp_line() {
        let time = Utc.with_ymd_and_hms(2021, 6, 1, 7, 5, 9).unwrap();
        let report = Report::new(vec![]).with_time(&time);
        assert_eq!(report.to_string(), "07:05:09\nCOMM             PID     COUNT\n\n");
    }

    #[test]
    fn long_name_fits_column() {
        let report = Report::new(vec![(CounterKey::new(1, "abcdefghijklmnopqrstuvwxyz"), 1)]);
        let text = report.to_string();
        let row = text.lines().nth(1).unwrap();
        assert_eq!(row, "abcdefghijklmno  1       1");

        let key = CounterKey { pid: 1, comm: *b"0123456789abcdef" };
        let text = Report::new(vec![(key, 2)]).to_string();
        assert_eq!(text.lines().nth(1).unwrap(), "0123456789abcdef 1       2");
    }
}

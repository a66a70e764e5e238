// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

use std::{io::Write, time::Duration};
use chrono::Local;
use super::{CounterTable, Error, Extractor, Interrupt, Report};

/// Parameters of the report loop.
#[derive(Debug, Clone)]
pub struct Config {
    pub interval: Duration,
    pub count: u64,
    pub show_timestamp: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            interval: Duration::from_secs(1),
            count: 99_999_999,
            show_timestamp: true,
        }
    }
}

/// Drains `table` every `config.interval` and writes a report to `out`, up to
/// `config.count` times. An interrupt ends the loop after one more report.
pub fn run<T, W>(
    config: &Config,
    table: &T,
    extractor: Extractor,
    interrupt: &Interrupt,
    out: &mut W,
) -> Result<(), Error>
where
    T: CounterTable + ?Sized,
    W: Write,
{
    let mut countdown = config.count;
    loop {
        let exiting = interrupt.wait(config.interval);
        let now = Local::now();

        let entries = extractor.snapshot_and_clear(table)?;
        tracing::debug!("drained {} entries", entries.len());
        let report = Report::new(entries);
        let report = if config.show_timestamp {
            report.with_time(&now)
        } else {
            report
        };
        // whole cycle in one write
        out.write_all(report.to_string().as_bytes())?;
        out.flush()?;

        countdown = countdown.saturating_sub(1);
        if exiting || countdown == 0 {
            writeln!(out, "Detaching...")?;
            out.flush()?;
            return Ok(());
        }
    }
}

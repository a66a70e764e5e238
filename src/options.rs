// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

use std::time::Duration;
use structopt::StructOpt;
use super::Config;

#[derive(StructOpt, Debug)]
#[structopt(name = "swapin", about = "Count swapin events by process.")]
pub struct Opts {
    #[structopt(short = "T", long, help = "do not show the timestamp (HH:MM:SS)")]
    pub notime: bool,
    #[structopt(short, long, help = "log debug messages to stderr")]
    pub verbose: bool,
    #[structopt(
        default_value = "1",
        parse(try_from_str = positive),
        help = "output interval, in seconds"
    )]
    pub interval: u64,
    #[structopt(
        default_value = "99999999",
        parse(try_from_str = positive),
        help = "number of outputs"
    )]
    pub count: u64,
}

fn positive(s: &str) -> Result<u64, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("must be greater than zero".to_string()),
        Ok(v) => Ok(v),
        Err(error) => Err(error.to_string()),
    }
}

impl Opts {
    pub fn config(&self) -> Config {
        Config {
            interval: Duration::from_secs(self.interval),
            count: self.count,
            show_timestamp: !self.notime,
        }
    }
}

// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! Finding the kernel function the swap-in probe attaches to.

use std::{
    collections::HashSet,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};
use super::Error;

/// Candidate hook points, in order of preference. Kernels with folio
/// support renamed `swap_readpage` to `swap_read_folio`.
pub const HOOKS: [&str; 2] = ["swap_readpage", "swap_read_folio"];

const FILTER_FUNCTIONS: [&str; 2] = [
    "/sys/kernel/tracing/available_filter_functions",
    "/sys/kernel/debug/tracing/available_filter_functions",
];

const KALLSYMS: &str = "/proc/kallsyms";

/// Reads a symbol list, either `available_filter_functions`
/// (`name [module]`) or `kallsyms` (`address type name [module]`). Only
/// text symbols are taken from `kallsyms`.
pub fn parse<R>(reader: R) -> io::Result<HashSet<String>>
where
    R: BufRead,
{
    let mut symbols = HashSet::new();
    for line in reader.lines() {
        let line = line?;
        let mut words = line.split_whitespace();
        let first = match words.next() {
            Some(w) => w,
            None => continue,
        };
        let second = words.next();
        let third = words.next();
        let name = match (second, third) {
            (Some(ty), Some(name)) if is_address(first) && ty.len() == 1 => {
                if !ty.eq_ignore_ascii_case("t") {
                    continue;
                }
                name
            },
            _ => first,
        };
        symbols.insert(name.to_string());
    }
    Ok(symbols)
}

fn is_address(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// First of `HOOKS` present in `symbols`.
pub fn select_hook(symbols: &HashSet<String>) -> Result<&'static str, Error> {
    HOOKS
        .iter()
        .find(|hook| symbols.contains(**hook))
        .copied()
        .ok_or(Error::NoSwapHook)
}

/// Traceable kernel functions, from tracefs if it is mounted, otherwise from `kallsyms`.
pub fn traceable() -> Result<HashSet<String>, Error> {
    for path in FILTER_FUNCTIONS.iter() {
        match read(path) {
            Ok(symbols) => return Ok(symbols),
            Err(error) => tracing::debug!("cannot read {}: {}", path, error),
        }
    }
    read(KALLSYMS).map_err(Error::Io)
}

fn read<P>(path: P) -> io::Result<HashSet<String>>
where
    P: AsRef<Path>,
{
    parse(BufReader::new(File::open(path)?))
}

/// Resolves the hook point on the running kernel.
pub fn find_hook() -> Result<&'static str, Error> {
    let symbols = traceable()?;
    let hook = select_hook(&symbols)?;
    tracing::info!("swap-in hook: {}", hook);
    Ok(hook)
}

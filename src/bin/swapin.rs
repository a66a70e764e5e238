// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

use std::{io, process};
use structopt::StructOpt;
use tracing::Level;
use swapin::{symbols, Error, Extractor, Interrupt, KernelTable, Opts};

fn main() {
    let opts = Opts::from_args();

    let level = if opts.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    if let Err(error) = run(&opts) {
        println!("ERROR: {}", error);
        process::exit(1);
    }
}

fn run(opts: &Opts) -> Result<(), Error> {
    sudo::escalate_if_needed().map_err(|e| Error::Privileges(e.to_string()))?;

    let hook = symbols::find_hook()?;
    let mut table = KernelTable::load()?;
    // probe while the map is still empty, nothing is attached yet
    let extractor = Extractor::probe(&table);
    tracing::info!("extractor: {:?}", extractor);
    table.attach(hook)?;

    let interrupt = Interrupt::new();
    {
        let interrupt = interrupt.clone();
        ctrlc::set_handler(move || interrupt.trigger())?;
    }

    println!("Counting swap ins. Ctrl-C to end.");
    let stdout = io::stdout();
    let mut out = stdout.lock();
    swapin::run(&opts.config(), &table, extractor, &interrupt, &mut out)
}

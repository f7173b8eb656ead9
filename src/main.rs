use clap::Parser;
use log::debug;
use snafu::ErrorCompat;

mod app;
mod args;

fn main() {
    let parsed = args::Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if parsed.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
    debug!("args: {:?}", parsed);

    if let Err(e) = app::run(&parsed) {
        eprintln!("An error occurred: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}

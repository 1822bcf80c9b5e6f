use clap::Parser;
use log::debug;
use snafu::ErrorCompat;

mod args;
mod machine;

fn main() {
    let args = args::Args::parse();
    if args.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();
    debug!("args: {:?}", args);

    if let Err(e) = machine::run_machine(&args) {
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}

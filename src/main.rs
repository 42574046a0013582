use slab_mc::{run, Config};
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = match std::env::args().nth(1) {
        Some(path) => Config::from_file(path),
        None => Config::new(),
    };
    let cfg = cfg.unwrap_or_else(|err| {
        eprintln!("Problem parsing configuration: {:?}", err);
        process::exit(1);
    });

    if let Err(e) = run(&cfg) {
        eprintln!("Application error: {:?}", e);
        process::exit(1);
    }
}

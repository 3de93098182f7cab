use clap::Parser;
use lc3_vm::emulator::Emulator;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Runs LC-3 program images.
#[derive(Parser, Debug)]
#[command(name = "lc3-vm", version, about, long_about = None)]
struct Args {
    /// Program images, big-endian words starting with the origin address
    #[arg(required = true, value_name = "IMAGE")]
    images: Vec<PathBuf>,

    /// Log filter used when RUST_LOG is not set, e.g. `info` or `lc3_vm=trace`
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    let mut emu = Emulator::new();
    for image in &args.images {
        if let Err(e) = emu.load_program(image) {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    }
    match emu.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

//! leap_theremin: interactive entry point.

use leap_theremin::app::{run, AppConfig};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Leap Theremin — pad & pluck gesture instrument      ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Mode: LeapMotion hardware");
    #[cfg(not(feature = "leap"))]
    println!("  Mode: Mouse + keyboard simulation  (use --features leap for hardware)");
    println!();

    let cfg = match AppConfig::from_args(std::env::args().skip(1)) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    if let Some(path) = &cfg.record_path {
        println!("  Recording to {path}");
    }
    println!("  Opening window…");
    println!();

    if let Err(e) = run(cfg) {
        error!("{e}");
        std::process::exit(1);
    }
}

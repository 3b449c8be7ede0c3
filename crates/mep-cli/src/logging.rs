//! Tracing setup (ambient stack, §6 "Log destination is either stdout or
//! `<stat_dir>/<base>_<date>.log`"): a single registry+fmt pipeline, initialized once behind a
//! `Once` guard with a panic hook installed alongside it, generalized to route to a dated log
//! file under `--stat-dir` when one is given.
use std::fs::File;
use std::path::Path;
use std::sync::Once;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static INIT: Once = Once::new();

pub fn init(verbose: bool, quiet: bool, stat_dir: Option<&Path>) {
    INIT.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            tracing::error!("panic: {info}");
        }));

        let default_level = if quiet {
            "warn"
        } else if verbose {
            "debug"
        } else {
            "info"
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .with_target(false)
            .compact();

        if let Some(dir) = stat_dir {
            match open_log_file(dir) {
                Ok(file) => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt_layer.with_writer(move || file.try_clone().expect("log file handle")))
                        .init();
                    return;
                }
                Err(err) => eprintln!("warning: could not open log file under {}: {err}", dir.display()),
            }
        }

        tracing_subscriber::registry().with(filter).with(fmt_layer).init();
    });
}

fn open_log_file(stat_dir: &Path) -> std::io::Result<File> {
    std::fs::create_dir_all(stat_dir)?;
    let date = chrono::Local::now().format("%Y%m%d");
    File::create(stat_dir.join(format!("mep_{date}.log")))
}

use flexi_logger::{FileSpec, Logger};
use log::{error, info, warn};
use pbilsat::param;
use pbilsat::run;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::env;
use std::process::exit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn main() {
    let args: Vec<String> = env::args().collect();
    let param_path = if args.len() > 1 {
        args[1].clone()
    } else {
        "param.yaml".to_string()
    };

    let param = match param::get(param_path.clone()) {
        Ok(param) => param,
        Err(e) => {
            eprintln!("Unable to read parameter file {}: {}", param_path, e);
            exit(1);
        }
    };

    // Log to stderr, or to a file when log_base is set
    let logger = Logger::try_with_str(&param.general.log_level);
    let logger = match logger {
        Ok(logger) => {
            if param.general.log_base.is_empty() {
                logger.start()
            } else {
                logger
                    .log_to_file(
                        FileSpec::default()
                            .basename(param.general.log_base.clone())
                            .suffix(param.general.log_suffix.clone()),
                    )
                    .start()
            }
        }
        Err(e) => {
            eprintln!("Invalid log level {}: {}", param.general.log_level, e);
            exit(1);
        }
    };
    let _logger_handle = match logger {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Logger initialization failed: {}", e);
            exit(1);
        }
    };

    // Finish the current generation cleanly on SIGINT/SIGTERM
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    let mut signals = match Signals::new([SIGINT, SIGTERM]) {
        Ok(signals) => signals,
        Err(e) => {
            error!("Could not install signal handlers: {}", e);
            exit(1);
        }
    };
    thread::spawn(move || {
        for signal in signals.forever() {
            warn!("Received signal {}, finishing current generation...", signal);
            flag.store(false, Ordering::Relaxed);
        }
    });

    info!(
        "pbilsat {} starting with parameter file {}",
        env!("CARGO_PKG_VERSION"),
        param_path
    );

    match run(&param, running) {
        Ok(experiment) => {
            println!("{}", experiment.display(param.general.n_solution_to_display));
            if !param.general.save_exp.is_empty() {
                match experiment.save_auto(&param.general.save_exp) {
                    Ok(()) => info!("Experiment saved to {}", param.general.save_exp),
                    Err(e) => {
                        error!("Could not save experiment: {}", e);
                        exit(1);
                    }
                }
            }
        }
        Err(e) => {
            error!("Run failed: {}", e);
            exit(1);
        }
    }
}

use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};

use fuzzy_merge::cli::{Cli, Command};
use fuzzy_merge::error::MatchError;
use fuzzy_merge::matching::MatchControl;
use fuzzy_merge::orchestrator::run_merge;
use fuzzy_merge::util::envfile::{load_dotenv_if_present, write_env_template};

const EXIT_STOPPED: i32 = 130;

fn main() {
    // before the runtime starts: .env values land in the process environment
    if let Err(e) = load_dotenv_if_present() {
        eprintln!("Failed to load .env: {:#}", e);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let args = match cli.command {
        Command::EnvTemplate { path } => {
            if let Err(e) = write_env_template(&path) {
                error!("{:#}", e);
                std::process::exit(1);
            }
            info!("Wrote environment template to {}", path);
            return;
        }
        Command::Match(args) => args,
    };

    let cfg = match args.to_app_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    let control = MatchControl::new();
    let outcome = runtime.block_on(async {
        let interrupt = control.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received; stopping after the current batch");
                interrupt.cancel();
            }
        });
        let worker = control.clone();
        tokio::task::spawn_blocking(move || run_merge(&cfg, &worker)).await
    });

    match outcome {
        Ok(Ok(_summary)) => {}
        Ok(Err(e)) => {
            if let Some(stopped) = e.downcast_ref::<MatchError>() {
                warn!("{}; no output written", stopped);
                std::process::exit(EXIT_STOPPED);
            }
            error!("{:#}", e);
            std::process::exit(1);
        }
        Err(join_err) => {
            error!("Merge task failed: {}", join_err);
            std::process::exit(1);
        }
    }
}

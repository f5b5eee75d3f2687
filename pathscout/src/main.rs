use pathscout::{command_argument_builder, init_logging, render_output, settings_from_matches};
use pathscout::CliSettings;
use pathscout_core::crawl::execute_crawl;
use std::io::Write;
use std::process::ExitCode;
use tracing::{error, info, warn};

/// Exit status after Ctrl-C, as a shell reports SIGINT.
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let matches = command_argument_builder().get_matches();
    let settings = settings_from_matches(&matches);
    init_logging(settings.log_level);

    match run(settings).await {
        Ok(Outcome::Completed) => ExitCode::SUCCESS,
        // A stdin read may still be blocking a runtime thread, so exit
        // without waiting for the runtime to shut down.
        Ok(Outcome::Interrupted) => std::process::exit(EXIT_INTERRUPTED),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

enum Outcome {
    Completed,
    Interrupted,
}

async fn run(settings: CliSettings) -> anyhow::Result<Outcome> {
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let state = execute_crawl(settings.crawl.clone(), shutdown)
        .await
        .map_err(anyhow::Error::msg)?;

    if !state.failures().is_empty() {
        info!("{} inputs could not be scanned", state.failures().len());
    }

    let output = render_output(&state, &settings)?;
    if !output.is_empty() {
        println!("{}", output);
    }
    std::io::stdout().flush()?;

    if state.is_interrupted() {
        Ok(Outcome::Interrupted)
    } else {
        Ok(Outcome::Completed)
    }
}

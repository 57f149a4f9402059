use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod domain;
mod film;
mod inputter;
mod model;
mod ui;

use controller::Controller;
use domain::{FtvConfig, FtvError};
use model::{Model, Status};
use ui::TableUI;

#[derive(Parser, Debug)]
#[command(name = "ftv", version, about = "A tui based film table viewer.")]
struct Cli {
    /// JSON file holding the film records
    #[arg(default_value = "films.json")]
    path: String,

    /// Event poll time in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_time: u64,

    /// Widest a single column is allowed to get
    #[arg(long, default_value_t = 40)]
    max_column_width: usize,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            ratatui::restore();
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
        Ok(_) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

// The terminal belongs to the UI, logs go to a file.
fn init_logging(verbose: bool) -> Result<(), FtvError> {
    let logfile = std::fs::File::create("ftv.log")?;
    let default_filter = if verbose { "ftv=debug" } else { "ftv=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(logfile))
                .with_ansi(false),
        )
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn run() -> Result<(), FtvError> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    info!("Starting ftv!");

    let path = PathBuf::from(
        shellexpand::full(&cli.path)
            .map_err(|e| FtvError::LoadingFailed(e.to_string()))?
            .into_owned(),
    );

    let cfg = FtvConfig {
        event_poll_time: cli.poll_time,
        max_column_width: cli.max_column_width,
    };

    let mut terminal = ratatui::init();
    let size = terminal.size()?;
    let mut model = Model::init(size.width as usize, size.height as usize);

    // A load failure is logged and swallowed, the table just stays empty.
    if let Err(e) = model.load_data_file(path.clone()) {
        error!("Loading {} failed: {:?}", path.display(), e);
        model.report_load_failure(&path);
    }

    let ui = TableUI::new(&cfg);
    let controller = Controller::new(&cfg);

    while model.status != Status::QUITTING {
        terminal.draw(|f| ui.draw(model.get_uidata(), f))?;
        if let Some(message) = controller.handle_event(&model)? {
            model.update(message)?;
        }
    }

    Ok(())
}

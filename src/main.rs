use std::path::PathBuf;
use std::process::ExitCode;

use chatter::app::AppState;
use chatter::ui::console::Console;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "chatter", version, about = "Chatter client")]
struct Cli {
    /// Settings file (defaults to <config dir>/chatter.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// REST base URL
    #[arg(long)]
    api_url: Option<String>,

    /// WebSocket base URL
    #[arg(long)]
    ws_url: Option<String>,

    /// Use the line console instead of the GTK window
    #[cfg(feature = "gtk")]
    #[arg(long)]
    console: bool,
}

fn run_console(state: AppState, config: Option<PathBuf>) -> ExitCode {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    match runtime.block_on(Console::new(state, config).run()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Console stopped: {e}");
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (mut state, load_error) = match AppState::load(cli.config.as_deref()) {
        Ok(state) => (state, None),
        Err(e) => (AppState::default(), Some(e)),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(state.log_level.as_str()),
    )
    .init();
    if let Some(e) = load_error {
        log::warn!("Failed to load settings, using defaults: {e}");
    }

    state.apply_env();
    state.apply_overrides(cli.api_url, cli.ws_url);
    log::debug!("Using API {} and push {}", state.api_url, state.effective_ws_url());

    #[cfg(feature = "gtk")]
    if !cli.console {
        let code = chatter::ui::gtk::run(state, cli.config);
        return if code == glib::ExitCode::SUCCESS {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    run_console(state, cli.config)
}

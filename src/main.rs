// main.rs

mod api;
mod app;
mod config;
mod error;
mod logging;
mod models;
mod state;
mod ui;

use crate::api::HttpTaskApi;
use crate::app::App;
use crate::config::Config;
use crate::error::AppError;
use crate::state::Action;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dotenv::dotenv;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::load()?;
    logging::init_tracing(&config.log_file)?;
    info!(api_url = %config.api_url, timeout = ?config.timeout, "starting");

    let api = HttpTaskApi::new(&config.api_url, config.timeout)?;
    let mut app = App::new(Arc::new(api));
    app.dispatch(Action::Mount);

    // Setup terminal UI
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    terminal.hide_cursor()?;

    let res = ui::run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(%err, "terminal session failed");
        eprintln!("Error: {:?}", err);
    }

    info!("exiting");
    Ok(())
}

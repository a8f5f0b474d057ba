use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use env_logger::{Env, Target};
use ratatui::prelude::{Backend, CrosstermBackend, Terminal};
use std::{
    fs::{self, OpenOptions},
    io,
    path::PathBuf,
    time::{Duration, Instant},
};

use podcastr::settings::SettingsManager;
use podcastr::tui::TuiApp;

#[tokio::main]
async fn main() -> Result<()> {
    // Log to a file, the terminal belongs to the UI
    let log_path = init_logging()?;

    // Set up panic hook to capture panic messages
    std::panic::set_hook(Box::new(|panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        eprintln!("PANIC: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            eprintln!("PANIC LOCATION: {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            eprintln!("PANIC MESSAGE: {}", msg);
        }
        std::process::exit(1);
    }));

    let settings_manager = SettingsManager::new()?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, DisableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the application
    let result = run_app(&mut terminal, settings_manager).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Handle any errors
    if let Err(err) = result {
        log::error!("Application error: {:?}", err);
        eprintln!("Application error: {:?}", err);
        eprintln!("See {} for details", log_path.display());
    }

    Ok(())
}

fn init_logging() -> Result<PathBuf> {
    let log_dir = dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("podcastr")
        .join("logs");
    fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join("podcastr.log");
    let log_file = OpenOptions::new().create(true).append(true).open(&log_path)?;

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(log_file)))
        .init();

    log::info!("Podcastr {} starting", env!("CARGO_PKG_VERSION"));
    Ok(log_path)
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, settings_manager: SettingsManager) -> Result<()> {
    let mut app = TuiApp::new(settings_manager)?;
    app.initialize().await;

    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();

    log::info!("Use Ctrl+C or 'q' to quit");

    loop {
        terminal.draw(|f| app.render(f))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_input(key).await?;

                    if app.should_quit() {
                        break;
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.update().await?;
            last_tick = Instant::now();
        }
    }

    log::info!("Goodbye");
    Ok(())
}

use clap::Parser;
use color_eyre::Result;
use potato::{
    chart_export, error_display, loader, logging, report, run_all, App, AppConfig, AppEvent,
    Args, CacheManager, ConfigManager, OpenOptions, APP_NAME,
};
use ratatui::DefaultTerminal;
use std::path::PathBuf;
use std::sync::mpsc::channel;
use std::time::Duration;

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(mut terminal: DefaultTerminal, args: &Args, config: &AppConfig) -> Result<()> {
    let (tx, rx) = channel::<AppEvent>();
    let mut app = App::new_with_config(tx.clone(), config)
        .with_open_options(OpenOptions::from_args_and_config(args, config));
    if let Ok(cache) = CacheManager::new(APP_NAME) {
        app = app.with_cache(cache);
    }
    if let Some(term) = &args.term {
        app = app.with_term(term);
    }
    if let Some(rows) = args.preview_rows {
        app = app.with_preview_rows(rows);
    }
    if let Some(dir) = &args.export_charts {
        app = app.with_export(dir.clone(), chart_format(args, config));
    }
    if args.debug {
        app.enable_debug();
    }
    render(&mut terminal, &mut app)?;
    if let Some(path) = &args.path {
        app.send_event(AppEvent::Open(
            path.clone(),
            OpenOptions::from_args_and_config(args, config),
        ))?;
    }

    let poll = Duration::from_millis(config.performance.event_poll_interval_ms);
    loop {
        if crossterm::event::poll(poll)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        return Err(color_eyre::eyre::eyre!(msg));
                    }
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

fn chart_format(args: &Args, config: &AppConfig) -> potato::ChartFormat {
    args.chart_format
        .unwrap_or_else(|| config.export.chart_format())
}

/// Print the six results for one term and exit without starting the interface.
fn run_report(args: &Args, config: &AppConfig) -> Result<()> {
    let Some(path) = &args.path else {
        return Err(color_eyre::eyre::eyre!("--report needs a file to read"));
    };
    let term = args
        .term
        .clone()
        .unwrap_or_else(|| config.query.default_term.clone());
    let options = OpenOptions::from_args_and_config(args, config);

    let dataset = loader::load_path(path, &options).map_err(|e| {
        color_eyre::eyre::eyre!(error_display::user_message_from_report(&e, Some(path)))
    })?;
    let results = run_all(&dataset, &term)?;

    if args.json {
        println!("{}", report::render_json(&results)?);
    } else {
        print!("{}", report::render_text(&results));
    }

    if let Some(dir) = &args.export_charts {
        for written in chart_export::export_charts(&results, dir, chart_format(args, config))? {
            eprintln!("Wrote {}", written.display());
        }
    }
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.clear_cache {
        match CacheManager::new(APP_NAME) {
            Ok(cache) => {
                match cache.clear_all() {
                    Ok(removed) => println!("Cache cleared successfully ({} files)", removed),
                    Err(e) => {
                        eprintln!("Error clearing cache: {}", e);
                        std::process::exit(1);
                    }
                }
                return Ok(Some(()));
            }
            Err(_e) => {
                println!("No cache to clear");
                return Ok(Some(()));
            }
        }
    }

    if args.generate_config {
        match ConfigManager::new(APP_NAME).and_then(|m| m.write_default_config(args.force)) {
            Ok(path) => {
                println!("Wrote default configuration to {}", path.display());
                return Ok(Some(()));
            }
            Err(e) => {
                eprintln!("Error generating config: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(None)
}

fn load_config() -> AppConfig {
    AppConfig::load(APP_NAME).unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
        AppConfig::default()
    })
}

fn log_path(args: &Args) -> Option<PathBuf> {
    args.log_file.clone().or_else(|| {
        CacheManager::new(APP_NAME)
            .ok()
            .map(|cache| cache.cache_file(potato::cache::LOG_FILE))
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    let config = load_config();
    let debug = args.debug || config.debug.enabled;

    if args.report {
        logging::init_stderr_logging(debug);
        if let Err(e) = run_report(&args, &config) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    if let Some(path) = log_path(&args) {
        if let Err(e) = logging::init_file_logging(&path, debug) {
            eprintln!("Warning: Could not open log file {}: {}", path.display(), e);
        }
    }

    color_eyre::install()?;
    let terminal = ratatui::init();
    let result = run(terminal, &args, &config);
    ratatui::restore();
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

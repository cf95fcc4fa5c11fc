// Native binary for kristx - Terminal UI mode

use anyhow::{anyhow, Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use kristx::{
    app::App,
    config::{load, Config},
    debug,
    krist_api::KristClient,
    options::QueryOptionsStore,
    table::BlocksTable,
    types::AppEvent,
    ui,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (safe to ignore if not found)
    let _ = dotenvy::dotenv();

    let cfg = load().context("Failed to load configuration")?;
    init_logging(&cfg)?;
    debug::set_from_list(&cfg.debug);
    if !cfg.debug.is_empty() {
        cfg.print_summary();
    }

    let client = Arc::new(KristClient::from_config(&cfg)?);

    if cfg.json {
        return dump_first_page(&cfg, client).await;
    }

    // terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // app + channels
    let (tx, rx) = unbounded_channel::<AppEvent>();
    let refresh_task = spawn_refresh_timer(cfg.refresh_interval_ms, tx.clone());
    let signal_tx = tx.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = signal_tx.send(AppEvent::Quit);
        }
    });

    let mut app = App::new(client, cfg.page_size, cfg.render_fps, cfg.cancel_superseded);
    app.mount();
    log::info!("kristx started against {}", cfg.node_url);

    // main loop
    let result = run_loop(&mut app, &mut terminal, rx).await;

    // cleanup
    app.shutdown();
    if let Some(task) = refresh_task {
        task.abort();
    }
    signal_task.abort();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn init_logging(cfg: &Config) -> Result<()> {
    // The terminal UI owns the screen; only log when there is somewhere else to write.
    let quiet = !cfg.json && cfg.log_file.is_none();
    let default_filter = if quiet { "off" } else { "warn" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));

    if !cfg.debug.is_empty() && !quiet {
        builder.filter_module("kristx::debug", log::LevelFilter::Debug);
    }
    if let Some(path) = &cfg.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {path}"))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn spawn_refresh_timer(interval_ms: u64, tx: UnboundedSender<AppEvent>) -> Option<JoinHandle<()>> {
    if interval_ms == 0 {
        return None;
    }
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
        ticker.tick().await; // first tick fires immediately; mount already looked up
        loop {
            ticker.tick().await;
            if tx.send(AppEvent::RefreshTick).is_err() {
                break;
            }
        }
    }))
}

async fn dump_first_page(cfg: &Config, client: Arc<KristClient>) -> Result<()> {
    let mut table = BlocksTable::new(client, QueryOptionsStore::initial_with_page_size(cfg.page_size));
    table.mount();
    table.settled().await;

    let state = table.state();
    if let Some(err) = state.error() {
        return Err(anyhow!("lookup failed: {err}"));
    }
    let result = state
        .result()
        .ok_or_else(|| anyhow!("lookup finished without a result"))?;

    let out = serde_json::json!({
        "options": table.options(),
        "count": result.count,
        "total": result.total,
        "blocks": result.items,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    table.unmount();
    Ok(())
}

async fn run_loop(
    app: &mut App<KristClient>,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut rx: UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let mut last_frame = Instant::now();
    let mut dirty = true;
    loop {
        // frame budget (coalesced renders)
        let frame_ms = 1000u32.saturating_div(app.fps()) as u64;
        let budget = Duration::from_millis(frame_ms.max(1));
        let wait = budget.saturating_sub(last_frame.elapsed());

        // input
        if event::poll(wait)? {
            if let Event::Key(k) = event::read()? {
                if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                    handle_key(app, k);
                    dirty = true;
                }
            } else {
                dirty = true; // resize and friends
            }
        }

        // timers
        while let Ok(ev) = rx.try_recv() {
            match ev {
                AppEvent::RefreshTick => {
                    app.refresh_tick();
                }
                AppEvent::Quit => app.quit(),
            }
            dirty = true;
        }

        // settled lookups
        if app.pump() {
            dirty = true;
        }

        if app.quit_flag() {
            break;
        }

        // Loading indicator and toast expiry need periodic redraws too
        if dirty || app.table().state().loading() || app.toast_message().is_some() {
            terminal.draw(|f| ui::draw(f, app))?;
            dirty = false;
        }
        last_frame = Instant::now();
    }
    Ok(())
}

fn handle_key(app: &mut App<KristClient>, k: KeyEvent) {
    let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);
    match k.code {
        KeyCode::Char('c') if ctrl => app.quit(),
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        KeyCode::Right | KeyCode::PageDown | KeyCode::Char('l') | KeyCode::Char('n') => app.next_page(),
        KeyCode::Left | KeyCode::PageUp | KeyCode::Char('h') | KeyCode::Char('p') => app.prev_page(),
        KeyCode::Home | KeyCode::Char('g') => app.first_page(),
        KeyCode::End | KeyCode::Char('G') => app.last_page(),

        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),

        KeyCode::Char(']') | KeyCode::Char('+') => app.grow_page_size(),
        KeyCode::Char('[') | KeyCode::Char('-') => app.shrink_page_size(),

        KeyCode::Char(c @ '1'..='5') => app.sort_column(c as usize - '1' as usize),

        KeyCode::Char('r') => app.refresh(),
        _ => {}
    }
}

use anyhow::Result;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io::{self, Write};
use std::sync::Arc;

use caseos_palette::app::keymap::KeyDecision;
use caseos_palette::domain::ports::{ExecutionObserver, KeyValueStore};
use caseos_palette::infrastructure::keys::{spawn_terminal_reader, ChannelKeySource};
use caseos_palette::infrastructure::router::TracingRouter;
use caseos_palette::infrastructure::storage::FileStore;
use caseos_palette::{logging, Command, EngineDeps, KeyInput, PaletteConfig, PaletteEngine};

struct PrintObserver;

impl ExecutionObserver for PrintObserver {
    fn on_command_executed(&self, command: &Command) {
        let _ = write!(io::stdout(), "ran: {}\r\n", command.title());
    }
}

fn setup_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        original_hook(panic_info);
    }));
}

fn print_palette<W: Write>(engine: &PaletteEngine, out: &mut W) -> io::Result<()> {
    if !engine.is_open() {
        write!(out, "[closed] Ctrl+K opens, Ctrl+Q quits\r\n")?;
        return out.flush();
    }
    write!(out, "> {}\r\n", engine.query())?;
    let results = engine.results();
    if results.is_empty() {
        write!(out, "  No commands found.\r\n")?;
    }
    let selected = engine.state().selected_index;
    let mut row = 0;
    for section in &results.sections {
        write!(out, "  {}\r\n", section.kind.heading())?;
        for cmd in &section.commands {
            let marker = if row == selected { '>' } else { ' ' };
            let shortcut = cmd.shortcut().map(|s| s.to_string()).unwrap_or_default();
            write!(out, "  {marker} {:<28} {shortcut}\r\n", cmd.title())?;
            row += 1;
        }
    }
    write!(out, "  {} commands\r\n", results.len())?;
    out.flush()
}

/// Handles keys until the source closes, redrawing after each one.
async fn drive<W: Write>(engine: &mut PaletteEngine, out: &mut W) -> io::Result<()> {
    print_palette(engine, out)?;
    while let Some(outcome) = engine.pump().await {
        match outcome {
            Ok(outcome) if outcome.decision == KeyDecision::Ignore && !outcome.consumed => {}
            Ok(_) => print_palette(engine, out)?,
            Err(err) => {
                tracing::error!(error = %err, "command failed");
                print_palette(engine, out)?;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init(None);
    setup_panic_hook();

    let config = PaletteConfig::load();
    let mut deps = EngineDeps::new(Arc::new(TracingRouter));
    deps.store =
        FileStore::default_location().map(|store| Arc::new(store) as Arc<dyn KeyValueStore>);
    deps.observer = Some(Arc::new(PrintObserver));
    let mut engine = PaletteEngine::mount(deps, &config).await?;

    let source = ChannelKeySource::new();
    engine.attach(&source)?;

    enable_raw_mode()?;
    let reader = spawn_terminal_reader(source.emitter(), KeyInput::ctrl("q"));

    let res = drive(&mut engine, &mut io::stdout()).await;

    // Restore terminal
    disable_raw_mode()?;
    engine.flush().await;

    // The reader blocks on the next key, so only wait for it after a clean quit.
    if res.is_ok() {
        reader.await?;
    }
    res?;
    Ok(())
}

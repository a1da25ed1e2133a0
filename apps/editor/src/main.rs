mod controller;

use anyhow::Context;
use std::time::Duration;

use newengine_core::{Bus, Engine, EngineConfig, EngineServices, ShutdownToken};
use newengine_modules_browser::BrowserModule;
use newengine_modules_logging::LoggingModule;

use controller::{spawn_stdin_commands, BrowserController, EditorEvent};

const DEFAULT_CONFIG: &str = "engine.toml";

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = EngineConfig::load_or_default(&config_path)?;

    let frame_budget = Duration::from_millis(u64::from(config.frame_ms));

    let shutdown = ShutdownToken::new();
    ctrlc::set_handler(shutdown.requester()).context("install ctrl-c handler")?;

    let bus: Bus<EditorEvent> = Bus::unbounded();
    spawn_stdin_commands(bus.sender());

    let mut engine: Engine<EditorEvent> =
        Engine::new(Box::new(EngineServices::new(config)), bus, shutdown)?;

    engine.register_module(Box::new(LoggingModule::new()))?;
    log::info!("editor: config '{config_path}'");

    engine.register_module(Box::new(BrowserModule::new()))?;
    engine.register_module(Box::new(BrowserController::new()))?;

    engine.start()?;
    engine.run(frame_budget)?;

    log::info!("editor: bye");
    Ok(())
}

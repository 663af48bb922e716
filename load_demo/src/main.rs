//! Load queue demo
//!
//! Drives the scene load queue against the in-memory host: a level is
//! loaded in two steps, the HUD scene gets a payload once it is live, and a
//! debrief scene is queued from a completion callback.
//!
//! Usage: `load_demo [config.toml|config.ron]`

use scene_loader::prelude::*;
use scene_loader::scene::simulated::SpawnHook;
use thiserror::Error;

#[derive(Error, Debug)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("load queue still busy after {ticks} ticks ({dropped} request(s) dropped)")]
    Stalled { ticks: u64, dropped: usize },
}

/// Logs every completion message a root object receives
fn announce_on_completion() -> SpawnHook<String> {
    Box::new(|scene: &str, object: ObjectId, listeners: &mut MessageRegistry<String>| {
        let scene = scene.to_string();
        listeners.register(
            object,
            MessageKind::LoadRequestCompleted,
            Box::new(move |message: &Message<'_, String>| {
                log::info!("{} in '{scene}' got {}: {}", message.target, message.kind, message.payload);
            }),
        );
    })
}

struct LoadDemoApp {
    config: ApplicationConfig,
    host: SimulatedHost<String>,
    loader: LoadQueueScheduler<SimulatedHost<String>>,
}

impl LoadDemoApp {
    fn new(config: ApplicationConfig) -> Result<Self, DemoError> {
        let mut host = SimulatedHost::new();
        host.register_scene("Hangar", SceneBlueprint::new(4, 2))
            .register_scene("Asteroids", SceneBlueprint::new(6, 3))
            .register_scene("Hud", SceneBlueprint::new(1, 1))
            .register_scene("Debrief", SceneBlueprint::new(2, 1))
            .set_spawn_hook(announce_on_completion());

        let loader = LoadQueueScheduler::with_config(config.loader.clone(), host.channel())?;
        Ok(Self { config, host, loader })
    }

    fn queue_requests(&mut self) {
        self.loader.submit(
            LoadRequest::new()
                .scene("Hangar")
                .scene("Asteroids")
                .on_completed(|request| {
                    let scenes: Vec<_> = request.loaded_scenes().collect();
                    log::info!("Level ready: {scenes:?}");
                }),
        );

        let sender = self.loader.sender();
        self.loader.submit(
            LoadRequest::with_payload("hud ready".to_string())
                .scene("Hud")
                .on_completed(move |_| {
                    log::info!("HUD live, queueing debrief");
                    let debrief = LoadRequest::new()
                        .scene("Debrief")
                        .on_completed(|_| log::info!("Debrief live"));
                    if sender.submit(debrief).is_err() {
                        log::warn!("Load queue gone, debrief not queued");
                    }
                }),
        );

        // An unregistered scene never finishes staging, so only queue it when it can time out
        if self.config.loader.staging_timeout_ticks.is_some() {
            self.loader.submit(
                LoadRequest::new()
                    .scene("Credits")
                    .on_failed(|_, error| log::warn!("Credits skipped: {error}")),
            );
        }
    }

    fn run(mut self) -> Result<(), DemoError> {
        self.queue_requests();

        let max_ticks = self.config.max_ticks;
        for _ in 0..max_ticks {
            self.host.advance();
            if self.loader.tick(&mut self.host) == SchedulerState::Idle {
                let stats = self.loader.stats();
                log::info!(
                    "Queue idle on tick {}: {} completed, {} failed, {} scene(s) loaded",
                    self.host.current_tick(),
                    stats.completed,
                    stats.failed,
                    stats.scenes_loaded
                );
                return Ok(());
            }
        }

        let dropped = self.loader.shutdown();
        Err(DemoError::Stalled {
            ticks: max_ticks,
            dropped,
        })
    }
}

fn load_config() -> Result<ApplicationConfig, DemoError> {
    let config = match std::env::args().nth(1) {
        Some(path) => ApplicationConfig::load_from_file(&path)?,
        None => ApplicationConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    logging::init_with_level(&config.log_level);

    log::info!("Starting load queue demo");
    match LoadDemoApp::new(config)?.run() {
        Ok(()) => {
            log::info!("Load queue demo finished successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Load queue demo failed: {e}");
            Err(e.into())
        }
    }
}

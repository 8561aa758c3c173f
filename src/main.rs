use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use salvo::clock::SimClock;
use salvo::config::{self, SimConfig};
use salvo::controller::ControllerId;
use salvo::definitions::DefinitionLibrary;
use salvo::error::SimResult;
use salvo::map::{Map, MapSettings};
use salvo::rng::{self, SimRng};
use salvo::simulation::{SimulationPlugin, SoundCue};

/// Seconds between status lines in the log.
const SUMMARY_INTERVAL: f64 = 5.0;

/// The controller driven by the local session.
#[derive(Resource, Debug, Clone, Copy)]
struct LocalPlayer(ControllerId);

/// Optional frame limit for scripted runs (`SALVO_FRAMES`).
#[derive(Resource, Debug, Default)]
struct FrameBudget {
    remaining: Option<u32>,
}

#[derive(Resource, Debug, Default)]
struct SummaryTimer {
    next: f64,
}

fn build_map(config: &SimConfig, rng: &mut SimRng) -> SimResult<Map> {
    let definitions = Arc::new(DefinitionLibrary::load(&config.definitions_path)?);
    info!(
        "Loaded {} actor and {} weapon definitions from {}",
        definitions.actor_count(),
        definitions.weapon_count(),
        config.definitions_path
    );
    Map::from_definition(
        definitions,
        &config.map_name,
        MapSettings::from(config),
        rng,
    )
}

/// Startup system: load definitions, build the configured map and spawn the
/// local player into it.  Any failure here is fatal.
fn setup_map(
    mut commands: Commands,
    mut config: ResMut<SimConfig>,
    mut rng: ResMut<SimRng>,
    mut exit: MessageWriter<AppExit>,
) {
    if let Ok(map_name) = env::var("SALVO_MAP") {
        config.map_name = map_name;
    }

    let mut map = match build_map(&config, &mut rng) {
        Ok(map) => map,
        Err(e) => {
            error!("Could not load map '{}': {e}", config.map_name);
            exit.write(AppExit::error());
            return;
        }
    };

    let player = map.add_player_controller();
    match map.spawn_player(player, &mut rng) {
        Ok(uid) => info!("Local player spawned as {uid}"),
        Err(e) => {
            error!("Could not spawn '{}': {e}", config.player_actor);
            exit.write(AppExit::error());
            return;
        }
    }
    commands.insert_resource(LocalPlayer(player));
    commands.insert_resource(map);
}

fn log_sounds(mut sounds: MessageReader<SoundCue>) {
    for sound in sounds.read() {
        debug!("sound '{}' at {:.2?}", sound.cue, sound.position);
    }
}

fn log_summary(
    clock: Res<SimClock>,
    map: Res<Map>,
    local: Res<LocalPlayer>,
    mut timer: ResMut<SummaryTimer>,
) {
    if clock.elapsed_secs() < timer.next {
        return;
    }
    timer.next = clock.elapsed_secs() + SUMMARY_INTERVAL;

    let (kills, deaths) = map
        .player(local.0)
        .map_or((0, 0), |p| (p.kills, p.deaths));
    info!(
        "t={:.1}s map '{}': {} actors, player {} kills / {} deaths",
        clock.elapsed_secs(),
        map.name(),
        map.actor_count(),
        kills,
        deaths
    );
}

fn count_frames(mut budget: ResMut<FrameBudget>, mut exit: MessageWriter<AppExit>) {
    let Some(remaining) = budget.remaining.as_mut() else {
        return;
    };
    if *remaining == 0 {
        info!("Frame budget exhausted; exiting");
        exit.write(AppExit::Success);
    } else {
        *remaining -= 1;
    }
}

fn main() {
    let frames = env::var("SALVO_FRAMES")
        .ok()
        .and_then(|value| value.parse::<u32>().ok());

    let mut app = App::new();

    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / 60.0,
        ))),
    )
    .add_plugins(LogPlugin::default())
    // SimConfig starts with compiled defaults; load_sim_config overwrites it
    // from assets/sim.toml (if present) before anything else reads it.
    .add_plugins(SimulationPlugin)
    .insert_resource(FrameBudget { remaining: frames })
    .init_resource::<SummaryTimer>()
    .add_systems(
        Startup,
        (
            config::load_sim_config,
            rng::reseed_from_config,
            setup_map,
        )
            .chain(),
    )
    .add_systems(
        Update,
        (
            log_sounds,
            log_summary.run_if(resource_exists::<Map>.and(resource_exists::<LocalPlayer>)),
            count_frames,
        ),
    );

    app.run();
}

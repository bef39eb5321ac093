use std::{path::PathBuf, time::Duration};

use ember_keep_cli::Simulation;
use ember_keep_core::Outcome;
use ember_keep_scenario::Scenario;

const FRAME: Duration = Duration::from_millis(20);

const ROUT: &str = r#"
    version = 1
    name = "rout"

    [base]
    max_health = 5.0
    starting_gems = 20

    [[paths]]
    name = "lane"
    points = [[0.0, 0.0], [40.0, 0.0]]

    [enemies.imp]
    max_health = 1.0
    move_speed = 2.0
    gem_reward = 1

    [[blueprints]]
    name = "bolt"
    build_cost = 10
    levels = [{ range = 10.0, fire_rate = 5.0, projectile = { speed = 50.0, lifetime = 2.0, payload = { kind = "direct", damage = 5.0 } } }]

    [[build_slots]]
    position = [5.0, 2.0]

    [schedule]
    first_wave_delay = 0.5

    [[waves]]
    name = "only"
    groups = [{ enemy = "imp", path = "lane", count = 3, spawn_interval = 1.0 }]

    [[script]]
    at = 0.0
    action = { kind = "build", slot = 0, blueprint = "bolt" }
"#;

fn scenario(contents: &str) -> Scenario {
    Scenario::from_toml_str(contents).expect("test scenario is valid")
}

#[test]
fn defended_base_wins() {
    let mut simulation = Simulation::new(scenario(ROUT), 0, FRAME);

    let summary = simulation.run(Duration::from_secs(60));

    assert_eq!(summary.outcome, Some(Outcome::Victory));
    assert_eq!(summary.waves_cleared, 1);
    assert_eq!(summary.enemies_killed, 3);
    assert_eq!(summary.enemies_leaked, 0);
    assert_eq!(summary.base_health, 5.0);
    assert_eq!(summary.gems, 20 - 10 + 3);
    assert_eq!(summary.towers, 1);
    assert!(!simulation.is_active());
    assert!(summary.to_string().contains("outcome:    victory"));
}

#[test]
fn undefended_base_falls() {
    let contents = ROUT
        .replace("max_health = 5.0", "max_health = 2.0")
        .replace("move_speed = 2.0", "move_speed = 20.0")
        .replace(
            "action = { kind = \"build\", slot = 0, blueprint = \"bolt\" }",
            "action = { kind = \"start_waves\" }",
        );
    let mut simulation = Simulation::new(scenario(&contents), 0, FRAME);

    let summary = simulation.run(Duration::from_secs(60));

    assert_eq!(summary.outcome, Some(Outcome::Defeat));
    assert_eq!(summary.base_health, 0.0);
    assert!(summary.enemies_leaked >= 2);
    assert_eq!(summary.towers, 0);
}

#[test]
fn base_falling_with_the_last_leak_is_a_defeat() {
    let contents = ROUT
        .replace("max_health = 5.0", "max_health = 3.0")
        .replace("move_speed = 2.0", "move_speed = 20.0")
        .replace(
            "action = { kind = \"build\", slot = 0, blueprint = \"bolt\" }",
            "action = { kind = \"start_waves\" }",
        );
    let mut simulation = Simulation::new(scenario(&contents), 0, FRAME);

    let summary = simulation.run(Duration::from_secs(60));

    assert_eq!(summary.enemies_leaked, 3);
    assert_eq!(summary.waves_cleared, 1);
    assert_eq!(summary.base_health, 0.0);
    assert_eq!(summary.outcome, Some(Outcome::Defeat));
}

#[test]
fn unstarted_schedule_runs_into_the_time_limit() {
    let contents = ROUT.replace("first_wave_delay = 0.5", "auto_start = false");
    let mut simulation = Simulation::new(scenario(&contents), 0, FRAME);

    let summary = simulation.run(Duration::from_secs(5));

    assert_eq!(summary.outcome, None);
    assert!(summary.elapsed >= Duration::from_secs(5));
    assert!(summary.elapsed < Duration::from_secs(5) + FRAME * 2);
    assert_eq!(summary.waves_cleared, 0);
    assert!(simulation.is_active());
}

#[test]
fn bundled_scenario_replays_identically() {
    let path = PathBuf::from(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../scenarios/ember_pass.toml"
    ));
    let play = || {
        let scenario = Scenario::load(&path).expect("bundled scenario is valid");
        Simulation::new(scenario, 7, FRAME).run(Duration::from_secs(900))
    };

    let first = play();
    let second = play();

    assert_eq!(first, second, "replay diverged between runs");
    assert!(first.outcome.is_some(), "bundled scenario must conclude");
    assert_eq!(first.wave_count, 3);
    assert!(first.towers >= 2);
}

//! Embermobs - Entry Point
//!
//! Console harness for exercising the script engine: loads script files,
//! spawns a demo boss and a few players, and steps the simulation from a
//! small command loop.

use embermobs::core::error::Result;
use embermobs::core::types::Location;
use embermobs::scripts::ScriptEngine;
use embermobs::{EngineConfig, GameWorld};

use std::io::{self, Write};
use std::path::Path;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "embermobs=debug".into()),
        )
        .init();

    tracing::info!("Embermobs starting...");

    let config = match std::fs::read_to_string("embermobs.toml") {
        Ok(raw) => EngineConfig::from_toml_str(&raw)?,
        Err(_) => EngineConfig::default(),
    };
    let mut engine = ScriptEngine::new(config);
    let mut world = GameWorld::new();

    let scripts_dir = Path::new("scripts");
    if scripts_dir.is_dir() {
        let loaded = engine.load_scripts_dir(scripts_dir)?;
        println!("Loaded {} script(s) from {}/", loaded, scripts_dir.display());
    } else {
        println!("No scripts/ directory found - starting with an empty registry");
    }

    let boss = engine.spawn_boss(&mut world, "ember_knight", Location::new("overworld", 0.0, 64.0, 0.0));
    for (name, x) in [("Marcus", 5.0), ("Elena", -4.0), ("Thomas", 9.0)] {
        let id = world.spawn_player(name, Location::new("overworld", x, 64.0, 0.0));
        engine.tracker.register_player(id);
    }
    engine.on_spawn(&mut world, boss);

    println!("\n=== EMBERMOBS ===");
    println!("Scripted boss behavior sandbox");
    println!();
    println!("Commands:");
    println!("  tick / t        - Advance the simulation by one tick");
    println!("  run <n>         - Run n ticks");
    println!("  hit <amount>    - Have the boss hit the nearest player");
    println!("  script <name>   - Run a loaded script by name");
    println!("  status / s      - Show world status");
    println!("  quit / q        - Exit");
    println!();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "q" {
            break;
        }
        if input == "tick" || input == "t" {
            engine.tick(&mut world);
            println!("Tick {} complete.", world.current_tick);
            continue;
        }
        if input == "status" || input == "s" {
            display_status(&world, &engine);
            continue;
        }
        if let Some(rest) = input.strip_prefix("run ") {
            match rest.parse::<u32>() {
                Ok(n) => {
                    for _ in 0..n {
                        engine.tick(&mut world);
                    }
                    println!("Completed {} ticks. Now at tick {}.", n, world.current_tick);
                }
                Err(_) => println!("Usage: run <number>"),
            }
            continue;
        }
        if let Some(rest) = input.strip_prefix("hit ") {
            match rest.parse::<f64>() {
                Ok(amount) => {
                    let victim = world
                        .players_in_world("overworld")
                        .into_iter()
                        .next();
                    match victim {
                        Some(victim) => {
                            let dealt = engine.on_damage(&mut world, boss, victim, amount);
                            world.deal_damage(victim, dealt, Some(boss), None);
                            println!("Boss hit a player for {:.1}.", dealt);
                        }
                        None => println!("No players left to hit."),
                    }
                }
                Err(_) => println!("Usage: hit <amount>"),
            }
            continue;
        }
        if let Some(name) = input.strip_prefix("script ") {
            match engine.run_script_by_name(&mut world, name, boss, None) {
                Ok(()) => println!("Ran script '{}'.", name),
                Err(err) => println!("Could not run script: {}", err),
            }
            continue;
        }
        println!("Unknown command. Available: tick, run <n>, hit <amount>, script <name>, status, quit");
    }

    engine.shutdown(&mut world);
    println!(
        "\nGoodbye! Final state: {} entities, {} ticks elapsed.",
        world.entity_count(),
        world.current_tick
    );
    Ok(())
}

fn display_status(world: &GameWorld, engine: &ScriptEngine) {
    println!("Tick {} | {} entities | {} scheduled task(s) | {} script(s) loaded",
        world.current_tick,
        world.entity_count(),
        engine.pending_tasks(),
        engine.scripts().len(),
    );
    let mut entities: Vec<_> = world.entities().collect();
    entities.sort_by(|a, b| a.name.cmp(&b.name));
    for entity in entities {
        println!(
            "  {:<12} {:?} hp {:>5.1}/{:<5.1} at ({:.1}, {:.1}, {:.1}){}",
            entity.name,
            entity.kind,
            entity.health,
            entity.max_health,
            entity.location.x,
            entity.location.y,
            entity.location.z,
            if entity.valid { "" } else { " [dead]" },
        );
    }
    println!(
        "Effects so far: {} damage, {} messages, {} particles, {} lightning",
        world.effects.damage.len(),
        world.effects.messages.len(),
        world.effects.particles.len(),
        world.effects.lightning.len(),
    );
}

//! Script objects and the name-keyed registry
//!
//! A `Script` is a parsed blueprint bound to executable actions. The
//! registry owns every loaded script; chaining and event dispatch both go
//! through it by name.

use std::rc::Rc;

use ahash::{AHashMap, AHashSet};
use tracing::{info, warn};

use crate::events::TriggerKind;
use crate::scripts::action::{ExecCtx, ScriptAction};
use crate::scripts::blueprint::{ActionKind, ScriptBlueprint};
use crate::scripts::conditions::ScriptConditions;
use crate::scripts::data::ScriptActionData;
use crate::scripts::zone::ZoneBlueprint;

pub struct Script {
    pub name: String,
    events: Vec<TriggerKind>,
    zone: Option<ZoneBlueprint>,
    conditions: ScriptConditions,
    actions: Vec<Rc<ScriptAction>>,
}

impl Script {
    pub fn from_blueprint(blueprint: &ScriptBlueprint) -> Self {
        let conditions = ScriptConditions::new(
            blueprint.conditions.clone(),
            blueprint.zone.clone(),
            &blueprint.name,
        );
        let actions = blueprint
            .bind_actions()
            .into_iter()
            .map(|action| Rc::new(ScriptAction::new(action, blueprint.zone.clone(), &blueprint.name)))
            .collect();
        Self {
            name: blueprint.name.clone(),
            events: blueprint.events.clone(),
            zone: blueprint.zone.clone(),
            conditions,
            actions,
        }
    }

    pub fn handles(&self, kind: TriggerKind) -> bool {
        self.events.contains(&kind)
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    pub fn has_zone(&self) -> bool {
        self.zone.is_some()
    }

    /// Names this script chains into, for load-time cycle checks.
    pub fn chained_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for action in &self.actions {
            names.extend(action.blueprint.scripts.iter().cloned());
            match &action.blueprint.kind {
                ActionKind::SpawnFallingBlock { landing_scripts, .. }
                | ActionKind::SummonEntity { landing_scripts, .. } => {
                    names.extend(landing_scripts.iter().cloned());
                }
                _ => {}
            }
        }
        names
    }

    /// Fire this script from a trigger event. The script-level gate runs
    /// once; each action then gets its own invocation context.
    pub fn run_from_event(&self, ctx: &mut ExecCtx, data: &ScriptActionData) {
        if !self
            .conditions
            .meets_action_conditions(ctx.world, ctx.tracker, ctx.config, ctx.rng, data)
        {
            return;
        }
        for action in &self.actions {
            action.run(ctx, data.clone());
        }
    }

    /// Fire this script as a chained child with inherited context.
    pub fn run_chained(&self, ctx: &mut ExecCtx, data: ScriptActionData) {
        self.run_from_event(ctx, &data);
    }
}

/// Every loaded script, keyed by name
#[derive(Default)]
pub struct ScriptRegistry {
    scripts: AHashMap<String, Rc<Script>>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register parsed blueprints. Duplicate names keep the first loaded
    /// script and warn. Returns how many were added.
    pub fn register_blueprints(&mut self, blueprints: &[ScriptBlueprint]) -> usize {
        let mut added = 0;
        for blueprint in blueprints {
            if self.scripts.contains_key(&blueprint.name) {
                warn!(script = %blueprint.name, "Duplicate script name, keeping the first");
                continue;
            }
            let script = Script::from_blueprint(blueprint);
            info!(script = %script.name, actions = script.action_count(), "Loaded script");
            self.scripts.insert(script.name.clone(), Rc::new(script));
            added += 1;
        }
        added
    }

    pub fn get(&self, name: &str) -> Option<Rc<Script>> {
        self.scripts.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Scripts subscribed to an event kind, name-ordered for determinism.
    pub fn scripts_for(&self, kind: TriggerKind) -> Vec<Rc<Script>> {
        let mut matching: Vec<Rc<Script>> = self
            .scripts
            .values()
            .filter(|s| s.handles(kind))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        matching
    }

    /// DFS over chain edges. Cycles are legal at runtime (the chain depth
    /// bound stops them) but almost always a config mistake, so warn here.
    pub fn warn_on_chain_cycles(&self) {
        let mut visited: AHashSet<&str> = AHashSet::new();
        for name in self.scripts.keys() {
            if !visited.contains(name.as_str()) {
                let mut path = Vec::new();
                self.visit(name, &mut visited, &mut path);
            }
        }
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        visited: &mut AHashSet<&'a str>,
        path: &mut Vec<&'a str>,
    ) {
        if let Some(position) = path.iter().position(|p| *p == name) {
            let cycle: Vec<&str> = path[position..].iter().copied().chain([name]).collect();
            warn!(cycle = %cycle.join(" -> "), "Script chain cycle detected");
            return;
        }
        if !visited.insert(name) {
            return;
        }
        let Some(script) = self.scripts.get(name) else {
            return;
        };
        path.push(name);
        for child in script.chained_names() {
            if let Some((key, _)) = self.scripts.get_key_value(child.as_str()) {
                self.visit(key, visited, path);
            }
        }
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripts::blueprint::ScriptFileBlueprint;

    fn parse(toml_src: &str) -> Vec<ScriptBlueprint> {
        toml::from_str::<ScriptFileBlueprint>(toml_src).unwrap().scripts
    }

    #[test]
    fn test_registry_keeps_first_on_duplicate() {
        let mut registry = ScriptRegistry::new();
        let blueprints = parse(
            r#"
            [[scripts]]
            name = "Twin"

            [[scripts.actions]]
            action = "STRIKE_LIGHTNING"

            [[scripts]]
            name = "Twin"
            "#,
        );
        assert_eq!(registry.register_blueprints(&blueprints), 1);
        assert_eq!(registry.get("Twin").unwrap().action_count(), 1);
    }

    #[test]
    fn test_scripts_for_filters_and_orders_by_name() {
        let mut registry = ScriptRegistry::new();
        registry.register_blueprints(&parse(
            r#"
            [[scripts]]
            name = "B"
            events = ["damage"]

            [[scripts]]
            name = "A"
            events = ["damage"]

            [[scripts]]
            name = "C"
            events = ["spawn"]
            "#,
        ));
        let names: Vec<String> = registry
            .scripts_for(TriggerKind::Damage)
            .iter()
            .map(|s| s.name.clone())
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_chained_names_include_landing_scripts() {
        let blueprints = parse(
            r#"
            [[scripts]]
            name = "Thrower"

            [[scripts.actions]]
            action = "SUMMON_ENTITY"
            entity_type = "fireball"
            velocity = { x = 0.0, y = 1.0, z = 0.0 }
            landing_scripts = ["Boom"]
            scripts = ["Tail"]
            "#,
        );
        let script = Script::from_blueprint(&blueprints[0]);
        let mut chained = script.chained_names();
        chained.sort();
        assert_eq!(chained, vec!["Boom", "Tail"]);
    }

    #[test]
    fn test_cycle_walk_terminates_on_self_reference() {
        let mut registry = ScriptRegistry::new();
        registry.register_blueprints(&parse(
            r#"
            [[scripts]]
            name = "Loop"

            [[scripts.actions]]
            action = "RUN_SCRIPT"
            scripts = ["Loop"]
            "#,
        ));
        // Must not recurse forever.
        registry.warn_on_chain_cycles();
    }
}

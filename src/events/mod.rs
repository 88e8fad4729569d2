//! Trigger events that start script execution
//!
//! An event is shared by every action invocation in the chain it started.
//! The damage payload is the one mutable piece: the MODIFY_DAMAGE action
//! rewrites it in place and the caller reads the final value back. All
//! access happens on the simulation thread.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Deserialize;

use crate::core::types::{EntityId, Location};

/// Event categories a script can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Damage,
    Spawn,
    TargetAcquire,
    Landing,
    Timer,
}

/// Mutable payload of a damage trigger
#[derive(Debug, Clone)]
pub struct DamagePayload {
    pub attacker: EntityId,
    pub victim: EntityId,
    pub damage: f64,
}

#[derive(Debug, Clone)]
pub enum TriggerEvent {
    Damage(DamagePayload),
    Spawn { entity: EntityId },
    TargetAcquire { entity: EntityId, target: EntityId },
    Landing { location: Location },
    Timer,
}

impl TriggerEvent {
    pub fn kind(&self) -> TriggerKind {
        match self {
            TriggerEvent::Damage(_) => TriggerKind::Damage,
            TriggerEvent::Spawn { .. } => TriggerKind::Spawn,
            TriggerEvent::TargetAcquire { .. } => TriggerKind::TargetAcquire,
            TriggerEvent::Landing { .. } => TriggerKind::Landing,
            TriggerEvent::Timer => TriggerKind::Timer,
        }
    }
}

/// Shared handle to the triggering event, cloned down the script chain
#[derive(Debug, Clone)]
pub struct ScriptEvent(Rc<RefCell<TriggerEvent>>);

impl ScriptEvent {
    pub fn new(event: TriggerEvent) -> Self {
        Self(Rc::new(RefCell::new(event)))
    }

    pub fn kind(&self) -> TriggerKind {
        self.0.borrow().kind()
    }

    pub fn damage(&self) -> Option<f64> {
        match &*self.0.borrow() {
            TriggerEvent::Damage(payload) => Some(payload.damage),
            _ => None,
        }
    }

    /// Scale the damage payload in place. False when the trigger is not a
    /// damage event.
    pub fn scale_damage(&self, multiplier: f64) -> bool {
        match &mut *self.0.borrow_mut() {
            TriggerEvent::Damage(payload) => {
                payload.damage *= multiplier;
                true
            }
            _ => false,
        }
    }
}

use std::collections::BTreeMap;

use foundation::Time;
use runtime::EventBus;
use view::{ControlParameter, ControlParameters};

use crate::dynamics::Dynamics;
use crate::method::{ControlEvent, ControlMethod, Input, InputContext};

const PARAMETER_COUNT: usize = ControlParameter::ALL.len();

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlsEvent {
    /// The first method became active.
    Active,
    /// The last active method stopped.
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlsError {
    DuplicateMethod(String),
    UnknownMethod(String),
    UnknownGroup(String),
    Locked,
}

impl std::fmt::Display for ControlsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlsError::DuplicateMethod(id) => {
                write!(f, "control method already registered: {id}")
            }
            ControlsError::UnknownMethod(id) => write!(f, "unknown control method: {id}"),
            ControlsError::UnknownGroup(id) => write!(f, "unknown control method group: {id}"),
            ControlsError::Locked => write!(f, "controls are locked"),
        }
    }
}

impl std::error::Error for ControlsError {}

struct MethodEntry {
    method: Box<dyn ControlMethod>,
    enabled: bool,
    active: bool,
    dynamics: [Dynamics; PARAMETER_COUNT],
    updated_at: [Time; PARAMETER_COUNT],
}

impl MethodEntry {
    fn reset_dynamics(&mut self, now: Time) {
        self.dynamics = [Dynamics::default(); PARAMETER_COUNT];
        self.updated_at = [now; PARAMETER_COUNT];
    }
}

/// Owns the registered control methods and folds their motion into one set
/// of parameter offsets per tick.
///
/// Contributions from methods driving the same parameter add up.
pub struct Controls {
    methods: BTreeMap<String, MethodEntry>,
    groups: BTreeMap<String, Vec<String>>,
    enabled: bool,
    locked: bool,
    width: f64,
    height: f64,
    last_time: Time,
    scratch: EventBus<ControlEvent>,
    events: EventBus<ControlsEvent>,
    active: bool,
}

impl std::fmt::Debug for Controls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controls")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("groups", &self.groups)
            .field("enabled", &self.enabled)
            .field("locked", &self.locked)
            .field("active", &self.active)
            .finish()
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::new()
    }
}

impl Controls {
    pub fn new() -> Self {
        Self {
            methods: BTreeMap::new(),
            groups: BTreeMap::new(),
            enabled: true,
            locked: false,
            width: 0.0,
            height: 0.0,
            last_time: Time::ZERO,
            scratch: EventBus::new(),
            events: EventBus::new(),
            active: false,
        }
    }

    pub fn register_method(
        &mut self,
        id: impl Into<String>,
        method: Box<dyn ControlMethod>,
        enabled: bool,
    ) -> Result<(), ControlsError> {
        let id = id.into();
        if self.methods.contains_key(&id) {
            return Err(ControlsError::DuplicateMethod(id));
        }
        tracing::debug!(method = %id, enabled, "registered control method");
        self.methods.insert(
            id,
            MethodEntry {
                method,
                enabled,
                active: false,
                dynamics: [Dynamics::default(); PARAMETER_COUNT],
                updated_at: [self.last_time; PARAMETER_COUNT],
            },
        );
        Ok(())
    }

    /// Removes a method, ending its interaction first.
    pub fn unregister_method(&mut self, id: &str) -> Result<Box<dyn ControlMethod>, ControlsError> {
        if !self.methods.contains_key(id) {
            return Err(ControlsError::UnknownMethod(id.to_string()));
        }
        self.stop_method(id);
        for members in self.groups.values_mut() {
            members.retain(|m| m != id);
        }
        let entry = self
            .methods
            .remove(id)
            .ok_or_else(|| ControlsError::UnknownMethod(id.to_string()))?;
        self.refresh_active();
        Ok(entry.method)
    }

    pub fn method_ids(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn is_method_enabled(&self, id: &str) -> bool {
        self.methods.get(id).is_some_and(|e| e.enabled)
    }

    pub fn enable_method(&mut self, id: &str) -> Result<(), ControlsError> {
        if self.locked {
            return Err(ControlsError::Locked);
        }
        let entry = self
            .methods
            .get_mut(id)
            .ok_or_else(|| ControlsError::UnknownMethod(id.to_string()))?;
        entry.enabled = true;
        Ok(())
    }

    /// Disables a method and abandons whatever it was doing; its motion
    /// stops immediately.
    pub fn disable_method(&mut self, id: &str) -> Result<(), ControlsError> {
        if self.locked {
            return Err(ControlsError::Locked);
        }
        if !self.methods.contains_key(id) {
            return Err(ControlsError::UnknownMethod(id.to_string()));
        }
        self.stop_method(id);
        if let Some(entry) = self.methods.get_mut(id) {
            entry.enabled = false;
        }
        self.refresh_active();
        Ok(())
    }

    pub fn add_method_group(
        &mut self,
        group: impl Into<String>,
        ids: &[&str],
    ) -> Result<(), ControlsError> {
        if let Some(missing) = ids.iter().find(|id| !self.methods.contains_key(**id)) {
            return Err(ControlsError::UnknownMethod(missing.to_string()));
        }
        self.groups
            .insert(group.into(), ids.iter().map(|id| id.to_string()).collect());
        Ok(())
    }

    pub fn remove_method_group(&mut self, group: &str) -> Result<(), ControlsError> {
        self.groups
            .remove(group)
            .map(|_| ())
            .ok_or_else(|| ControlsError::UnknownGroup(group.to_string()))
    }

    pub fn enable_method_group(&mut self, group: &str) -> Result<(), ControlsError> {
        for id in self.group_members(group)? {
            self.enable_method(&id)?;
        }
        Ok(())
    }

    pub fn disable_method_group(&mut self, group: &str) -> Result<(), ControlsError> {
        for id in self.group_members(group)? {
            self.disable_method(&id)?;
        }
        Ok(())
    }

    fn group_members(&self, group: &str) -> Result<Vec<String>, ControlsError> {
        self.groups
            .get(group)
            .cloned()
            .ok_or_else(|| ControlsError::UnknownGroup(group.to_string()))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Stops all methods and ignores input until re-enabled. Per-method
    /// enabled flags are kept.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        let ids: Vec<String> = self.methods.keys().cloned().collect();
        for id in &ids {
            self.stop_method(id);
        }
        self.enabled = false;
        self.refresh_active();
    }

    /// Freezes the enabled state of every method.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn active_controls(&self) -> Vec<&str> {
        self.methods
            .iter()
            .filter(|(_, e)| e.active)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True while any method is active or any motion is still decaying.
    pub fn is_moving(&self) -> bool {
        self.active
            || self
                .methods
                .values()
                .any(|e| e.dynamics.iter().any(|d| !d.is_settled()))
    }

    pub fn set_element_size(&mut self, width: f64, height: f64) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
    }

    fn context(&self, now: Time) -> InputContext {
        InputContext {
            now,
            width: self.width,
            height: self.height,
        }
    }

    /// Routes one input to every enabled method.
    pub fn handle_input(&mut self, input: &Input, now: Time) {
        if !self.enabled {
            return;
        }
        let ctx = self.context(now);
        let ids: Vec<String> = self
            .methods
            .iter()
            .filter(|(_, e)| e.enabled)
            .map(|(id, _)| id.clone())
            .collect();
        for id in ids {
            if let Some(entry) = self.methods.get_mut(&id) {
                entry.method.handle(input, &ctx, &mut self.scratch);
            }
            self.apply_method_events(&id, now);
        }
    }

    /// Integrates every method's motion up to `now` and returns the summed
    /// offsets to apply to the views.
    pub fn tick(&mut self, now: Time) -> ControlParameters {
        if self.enabled {
            let ctx = self.context(now);
            let ids: Vec<String> = self
                .methods
                .iter()
                .filter(|(_, e)| e.enabled)
                .map(|(id, _)| id.clone())
                .collect();
            for id in ids {
                if let Some(entry) = self.methods.get_mut(&id) {
                    entry.method.poll(&ctx, &mut self.scratch);
                }
                self.apply_method_events(&id, now);
            }
        }

        let mut out = ControlParameters::new();
        for entry in self.methods.values_mut() {
            for p in ControlParameter::ALL {
                let i = p.index();
                let elapsed = now.since(entry.updated_at[i]);
                out.add(p, entry.dynamics[i].advance(elapsed));
                entry.updated_at[i] = now;
            }
        }
        self.last_time = now;
        out
    }

    pub fn drain_events(&mut self) -> Vec<ControlsEvent> {
        self.events.drain_events().collect()
    }

    fn stop_method(&mut self, id: &str) {
        let now = self.last_time;
        if let Some(entry) = self.methods.get_mut(id) {
            entry.method.reset(&mut self.scratch);
        }
        self.apply_method_events(id, now);
        if let Some(entry) = self.methods.get_mut(id) {
            entry.active = false;
            entry.reset_dynamics(now);
        }
    }

    fn apply_method_events(&mut self, id: &str, now: Time) {
        let events: Vec<ControlEvent> = self.scratch.drain_events().collect();
        let Some(entry) = self.methods.get_mut(id) else {
            return;
        };
        for event in events {
            match event {
                ControlEvent::Active => {
                    entry.active = true;
                    entry.reset_dynamics(now);
                }
                ControlEvent::Inactive => entry.active = false,
                ControlEvent::ParameterDynamics {
                    parameter,
                    dynamics,
                } => {
                    let i = parameter.index();
                    let elapsed = now.since(entry.updated_at[i]);
                    entry.dynamics[i].update(&dynamics, elapsed);
                    entry.updated_at[i] = now;
                }
            }
        }
        self.refresh_active();
    }

    fn refresh_active(&mut self) {
        let active = self.methods.values().any(|e| e.active);
        if active != self.active {
            self.active = active;
            tracing::trace!(active, "controls activity changed");
            self.events.emit(if active {
                ControlsEvent::Active
            } else {
                ControlsEvent::Inactive
            });
        }
    }
}

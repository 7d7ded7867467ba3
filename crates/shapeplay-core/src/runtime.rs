//! Scene runtime: the live object list and the Edit/Play state machine.

use crate::clipboard::ClipboardBuffer;
use crate::config::RuntimeConfig;
use crate::console::Console;
use crate::input::{Command, MouseButton, PointerEvent};
use crate::object::{ObjectId, SceneObject};
use crate::properties::{EditError, PropertyEdit, PropertyView, INPUT_ERROR_TITLE};
use crate::render::Renderer;
use crate::script::{ScriptBridge, ScriptError};
use crate::selection::SelectionModel;
use crate::shapes::ShapeKind;
use crate::transform::TransformController;
use kurbo::Point;
use rhai::AST;
use std::fmt;
use thiserror::Error;

/// Title of the alert raised when a script fails.
pub const SCRIPT_ERROR_TITLE: &str = "Script Error";

/// Editor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Edit,
    Play,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Edit => "edit",
            Mode::Play => "play",
        })
    }
}

/// Mode plus the state that only exists while playing.
#[derive(Default)]
enum ModeState {
    #[default]
    Edit,
    Play {
        /// Scene as it was when play started.
        snapshot: Vec<SceneObject>,
        /// Compiled scripts that define `on_tick`.
        tick_hooks: Vec<(ObjectId, AST)>,
    },
}

/// Notifications for a view layer. Drained with [`SceneRuntime::take_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    ModeChanged(Mode),
    ObjectAdded(ObjectId),
    ObjectsDestroyed(Vec<ObjectId>),
    ObjectsPasted(Vec<ObjectId>),
    SelectionChanged,
    ScriptFailed { object: ObjectId, error: ScriptError },
}

/// Runtime errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("Invalid mode transition from {from} mode")]
    InvalidTransition { from: Mode },
    #[error("Script of object {object} failed: {source}")]
    Script {
        object: ObjectId,
        #[source]
        source: ScriptError,
    },
}

/// Owns the scene and everything that mutates it.
pub struct SceneRuntime {
    objects: Vec<SceneObject>,
    state: ModeState,
    selection: SelectionModel,
    clipboard: ClipboardBuffer,
    transform: TransformController,
    bridge: ScriptBridge,
    console: Box<dyn Console>,
    config: RuntimeConfig,
    events: Vec<SceneEvent>,
}

impl SceneRuntime {
    /// Create an empty scene in edit mode.
    pub fn new(config: RuntimeConfig, console: impl Console + 'static) -> Self {
        Self {
            objects: Vec::new(),
            state: ModeState::Edit,
            selection: SelectionModel::new(),
            clipboard: ClipboardBuffer::new(),
            transform: TransformController::new(),
            bridge: ScriptBridge::new(&config.script_limits),
            console: Box::new(console),
            config,
            events: Vec::new(),
        }
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|obj| obj.id() == id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|obj| obj.id() == id)
    }

    pub fn mode(&self) -> Mode {
        match self.state {
            ModeState::Edit => Mode::Edit,
            ModeState::Play { .. } => Mode::Play,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, ModeState::Play { .. })
    }

    /// Objects captured on entering play, if playing.
    pub fn snapshot(&self) -> Option<&[SceneObject]> {
        match &self.state {
            ModeState::Edit => None,
            ModeState::Play { snapshot, .. } => Some(snapshot),
        }
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn clipboard(&self) -> &ClipboardBuffer {
        &self.clipboard
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Drain pending events.
    pub fn take_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Mode transitions ---

    /// Edit -> Play.
    ///
    /// Snapshots the scene and runs every object's script in scene order.
    /// The first failing script aborts the session with a quiet rollback.
    pub fn enter_play(&mut self) -> Result<(), RuntimeError> {
        if self.is_playing() {
            return Err(RuntimeError::InvalidTransition { from: Mode::Play });
        }
        self.reset_interaction();
        self.state = ModeState::Play {
            snapshot: self.objects.clone(),
            tick_hooks: Vec::new(),
        };

        let mut hooks = Vec::new();
        for index in 0..self.objects.len() {
            let id = self.objects[index].id();
            let outcome = self.bridge.execute(&mut self.objects[index]);
            self.flush_script_output();
            match outcome {
                Ok(run) => {
                    for field in &run.dropped_fields {
                        self.console
                            .append_text(&format!("Script field `{field}` holds a function and was not kept"));
                    }
                    if let Some(ast) = run.tick_hook {
                        hooks.push((id, ast));
                    }
                }
                Err(error) => return Err(self.fail_script(id, error)),
            }
        }
        if let ModeState::Play { tick_hooks, .. } = &mut self.state {
            *tick_hooks = hooks;
        }

        log::info!("Entered play mode with {} objects", self.objects.len());
        self.announce_mode();
        Ok(())
    }

    /// Play -> Edit. Restores the snapshot.
    pub fn exit_play(&mut self) -> Result<(), RuntimeError> {
        if !self.restore_snapshot() {
            return Err(RuntimeError::InvalidTransition { from: Mode::Edit });
        }
        log::info!("Exited play mode");
        self.announce_mode();
        Ok(())
    }

    /// Flip the mode. Returns the new mode.
    pub fn toggle_play(&mut self) -> Result<Mode, RuntimeError> {
        if self.is_playing() {
            self.exit_play()?;
        } else {
            self.enter_play()?;
        }
        Ok(self.mode())
    }

    /// Restore the pre-play scene without announcing a mode change.
    ///
    /// Returns false if the runtime was not playing.
    pub fn quiet_rollback(&mut self) -> bool {
        let rolled_back = self.restore_snapshot();
        if rolled_back {
            log::info!("Rolled back to edit mode");
        }
        rolled_back
    }

    fn restore_snapshot(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            ModeState::Play { snapshot, .. } => {
                self.objects = snapshot;
                self.reset_interaction();
                true
            }
            ModeState::Edit => false,
        }
    }

    /// Drop the selection and any drag in progress.
    fn reset_interaction(&mut self) {
        self.transform.release();
        if !self.selection.is_empty() {
            self.selection.clear(&mut self.objects);
            self.events.push(SceneEvent::SelectionChanged);
        }
        // Restored objects may carry flags the model no longer tracks.
        self.selection.forget_all();
        for obj in &mut self.objects {
            obj.selected = false;
        }
    }

    fn announce_mode(&mut self) {
        let playing = self.is_playing();
        self.console.append_text(&format!("Play Mode is set to: ({playing})"));
        self.events.push(SceneEvent::ModeChanged(self.mode()));
    }

    fn fail_script(&mut self, object: ObjectId, error: ScriptError) -> RuntimeError {
        log::error!("Script of object {} failed: {}", object, error);
        let message = match error.location() {
            Some(location) => format!("{error} ({location})"),
            None => error.to_string(),
        };
        self.console.append_text(&message);
        self.console.alert(SCRIPT_ERROR_TITLE, &message);
        self.quiet_rollback();
        self.events.push(SceneEvent::ScriptFailed {
            object,
            error: error.clone(),
        });
        RuntimeError::Script { object, source: error }
    }

    fn flush_script_output(&mut self) {
        for line in self.bridge.take_output() {
            self.console.append_text(&line);
        }
    }

    /// Report an edit-only operation attempted while playing.
    fn refuse_while_playing(&mut self, message: &str) -> bool {
        if self.is_playing() {
            log::warn!("{}", message);
            self.console.append_text(message);
            true
        } else {
            false
        }
    }

    // --- Scene editing ---

    /// Add a new object of `kind` at the pointer position, using its preset.
    pub fn add_object(&mut self, kind: ShapeKind, at: Point) -> Option<ObjectId> {
        let preset = *self.config.preset(kind);
        let object = SceneObject::new_shape(kind, preset.origin(at), preset.size, preset.color);
        self.insert_object(object)
    }

    /// Append an object to the scene. Only allowed in edit mode.
    pub fn insert_object(&mut self, mut object: SceneObject) -> Option<ObjectId> {
        if self.refuse_while_playing("Unable to add shape in (Playing mode)") {
            return None;
        }
        object.selected = false;
        let id = object.id();
        let kind = object.shape.kind;
        self.objects.push(object);

        log::info!("Added {} {}", kind, id);
        self.console.append_text(&format!("Added shape: {kind}"));
        self.events.push(SceneEvent::ObjectAdded(id));
        Some(id)
    }

    /// Remove all selected objects. Returns the removed ids.
    pub fn destroy_selected(&mut self) -> Vec<ObjectId> {
        if self.refuse_while_playing("Unable to destroy objects in (Playing mode)") {
            return Vec::new();
        }
        let doomed = self.selection.ids().to_vec();
        if doomed.is_empty() {
            return doomed;
        }
        self.selection.clear(&mut self.objects);
        self.objects.retain(|obj| !doomed.contains(&obj.id()));
        self.transform.release();

        log::info!("Destroyed {} objects", doomed.len());
        self.console.append_text("Destroyed selected objects");
        self.events.push(SceneEvent::SelectionChanged);
        self.events.push(SceneEvent::ObjectsDestroyed(doomed.clone()));
        doomed
    }

    /// Copy the selection into the clipboard. Returns how many were copied.
    pub fn copy_selected(&mut self) -> usize {
        if self.refuse_while_playing("Unable to copy objects in (Playing mode)") {
            return 0;
        }
        if self.selection.is_empty() {
            return 0;
        }
        let selected = self
            .selection
            .ids()
            .iter()
            .filter_map(|&id| self.objects.iter().find(|obj| obj.id() == id));
        self.clipboard.store(selected);
        log::debug!("Copied {} objects", self.clipboard.len());
        self.clipboard.len()
    }

    /// Insert offset copies of the clipboard and select them.
    pub fn paste(&mut self) -> Vec<ObjectId> {
        if self.refuse_while_playing("Unable to paste objects in (Playing mode)") {
            return Vec::new();
        }
        if self.clipboard.is_empty() {
            return Vec::new();
        }
        self.selection.clear(&mut self.objects);

        let pasted = self.clipboard.paste(self.config.paste_offset);
        let ids: Vec<ObjectId> = pasted.iter().map(SceneObject::id).collect();
        self.objects.extend(pasted);
        self.selection.extend(&mut self.objects, &ids);

        log::info!("Pasted {} objects", ids.len());
        self.events.push(SceneEvent::ObjectsPasted(ids.clone()));
        self.events.push(SceneEvent::SelectionChanged);
        ids
    }

    // --- Input ---

    /// Route a pointer event. Selection and dragging only happen in edit mode.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
                modifiers,
            } => {
                if !self.is_playing() {
                    self.press(position, modifiers.is_multi_select());
                }
                self.transform.begin(position);
            }
            PointerEvent::Move { position, primary_held } => {
                if !primary_held {
                    self.transform.release();
                } else if !self.is_playing() {
                    self.transform.drag_to(position, &self.selection, &mut self.objects);
                }
            }
            PointerEvent::Up {
                button: MouseButton::Left,
                ..
            } => self.transform.release(),
            PointerEvent::Down { .. } | PointerEvent::Up { .. } => {}
        }
    }

    fn press(&mut self, position: Point, multi: bool) {
        let hit = self
            .objects
            .iter()
            .rev()
            .find(|obj| obj.hit_test(position))
            .map(SceneObject::id);
        match hit {
            Some(id) if multi => {
                self.selection.toggle(&mut self.objects, id);
            }
            Some(id) => {
                self.selection.select_only(&mut self.objects, id);
            }
            None => self.selection.clear(&mut self.objects),
        }
        self.events.push(SceneEvent::SelectionChanged);
    }

    /// Route a discrete editor command.
    pub fn handle_command(&mut self, command: Command) -> Result<(), RuntimeError> {
        match command {
            Command::AddObject { kind, at } => {
                self.add_object(kind, at);
            }
            Command::Copy => {
                self.copy_selected();
            }
            Command::Paste => {
                self.paste();
            }
            Command::Destroy => {
                self.destroy_selected();
            }
            Command::TogglePlay => {
                self.toggle_play()?;
            }
        }
        Ok(())
    }

    // --- Frame tick ---

    /// Advance one frame: run tick hooks if enabled, then draw every object.
    ///
    /// A failing hook rolls the scene back like a failed play entry before
    /// anything is drawn, so the frame shows the restored scene.
    pub fn tick(&mut self, dt: f64, renderer: &mut dyn Renderer) -> Result<(), RuntimeError> {
        let failure = if self.config.tick_hook {
            self.run_tick_hooks(dt)
        } else {
            None
        };
        let result = match failure {
            Some((id, error)) => Err(self.fail_script(id, error)),
            None => Ok(()),
        };

        renderer.begin_frame();
        for obj in &mut self.objects {
            if let Err(err) = obj.shape.normalize_color() {
                log::warn!("Skipping draw of {}: {}", obj.id(), err);
                continue;
            }
            if let Err(err) = renderer.draw(&obj.shape) {
                log::warn!("Failed to draw {}: {}", obj.id(), err);
            }
        }
        result
    }

    fn run_tick_hooks(&mut self, dt: f64) -> Option<(ObjectId, ScriptError)> {
        let ModeState::Play { tick_hooks, .. } = &self.state else {
            return None;
        };
        let mut failure = None;
        for (id, ast) in tick_hooks {
            let Some(obj) = self.objects.iter_mut().find(|obj| obj.id() == *id) else {
                continue;
            };
            if let Err(error) = self.bridge.call_tick(obj, ast, dt) {
                failure = Some((*id, error));
                break;
            }
        }
        self.flush_script_output();
        failure
    }

    // --- Property and script editing ---

    /// View of the first selected object.
    pub fn property_view(&self) -> Option<PropertyView> {
        let obj = self.first_selected()?;
        Some(PropertyView::of(&obj.shape, &obj.script))
    }

    /// Apply an edit to the first selected object.
    pub fn edit_property(&mut self, edit: PropertyEdit) -> Result<(), EditError> {
        if self.refuse_while_playing("Unable to edit properties in (Playing mode)") {
            return Err(EditError::Playing);
        }
        let id = self.selection.first().ok_or(EditError::NoSelection)?;
        let obj = self.object_mut(id).ok_or(EditError::NoSelection)?;
        if let Err(err) = edit.apply(&mut obj.shape) {
            log::warn!("Rejected property edit {:?}: {}", edit, err);
            self.console.alert(INPUT_ERROR_TITLE, &err.to_string());
            return Err(err);
        }
        Ok(())
    }

    pub fn script_of_first_selected(&self) -> Option<&str> {
        self.first_selected().map(|obj| obj.script.as_str())
    }

    /// Replace the script of the first selected object.
    pub fn set_script(&mut self, script: impl Into<String>) -> Result<(), EditError> {
        if self.refuse_while_playing("Unable to edit script in (Playing mode)") {
            return Err(EditError::Playing);
        }
        let id = self.selection.first().ok_or(EditError::NoSelection)?;
        let obj = self.object_mut(id).ok_or(EditError::NoSelection)?;
        obj.script = script.into();
        Ok(())
    }

    fn first_selected(&self) -> Option<&SceneObject> {
        self.selection.first().and_then(|id| self.object(id))
    }
}

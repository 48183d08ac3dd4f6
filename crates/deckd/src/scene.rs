use crate::gesture::Gesture;
use deckd_core::handler::{Command, Handler, KeySlot};
use deckd_core::surface::{Surface, MARGINS_FLUSH, MARGINS_PRESSED};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One page of key-to-handler bindings, index-stable for the process lifetime.
pub type Scene = Vec<Arc<dyn Handler>>;

/// Owns the scene list, the active index, and every supervised task spawned
/// on behalf of the active scene.
///
/// All methods must run inside the daemon's runtime: entering a scene and
/// dispatching gestures spawn tasks. A scene switch aborts the outgoing
/// scene's tasks before any incoming task is created, so background work
/// never leaks across pages.
pub struct SceneCoordinator {
    scenes: Vec<Scene>,
    active: usize,
    slots: Vec<KeySlot>,
    tasks: Vec<JoinHandle<()>>,
}

impl SceneCoordinator {
    pub fn new(
        scenes: Vec<Scene>,
        surface: Arc<dyn Surface>,
        commands: mpsc::UnboundedSender<Command>,
    ) -> Self {
        let keys = scenes.first().map_or(0, |scene| scene.len());
        let slots = (0..keys)
            .map(|key| KeySlot::new(key, surface.clone(), commands.clone()))
            .collect();
        Self {
            scenes,
            active: 0,
            slots,
            tasks: Vec::new(),
        }
    }

    pub fn current_scene(&self) -> usize {
        self.active
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Start the first scene's appear hooks. Called once at startup.
    pub fn start(&mut self) {
        self.enter(self.active);
    }

    /// Switch scenes by a relative delta; wraps in both directions.
    pub fn advance(&mut self, delta: i64) {
        let count = self.scenes.len() as i64;
        if count == 0 {
            return;
        }
        let next = (self.active as i64 + delta).rem_euclid(count) as usize;
        self.switch_to(next);
    }

    /// Jump to an absolute scene index (wrapped into range).
    pub fn activate(&mut self, index: usize) {
        if self.scenes.is_empty() {
            return;
        }
        self.switch_to(index % self.scenes.len());
    }

    fn switch_to(&mut self, next: usize) {
        debug!(from = self.active, to = next, "scene switch");
        self.leave();
        self.active = next;
        self.enter(next);
    }

    /// Tear down the active scene: abort its supervised tasks, then stop and
    /// notify each handler in index order. The hooks themselves are fire and
    /// forget; the stop flags are set synchronously so no handler can render
    /// after this returns.
    fn leave(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        let Some(scene) = self.scenes.get(self.active) else {
            return;
        };
        for (key, handler) in scene.iter().enumerate() {
            handler.base().set_stopped(true);
            let handler = handler.clone();
            let slot = self.slots[key].clone();
            tokio::spawn(async move {
                if let Err(e) = handler.on_will_disappear(&slot).await {
                    warn!(key, error = %e, "disappear hook failed");
                }
            });
        }
    }

    /// Bring up a scene: clear each handler's stop flag and spawn its appear
    /// hook as a supervised task. The switch is complete once the tasks are
    /// started; appear hooks may keep running for the life of the scene.
    fn enter(&mut self, index: usize) {
        let Some(scene) = self.scenes.get(index) else {
            return;
        };
        for (key, handler) in scene.iter().enumerate() {
            handler.base().set_stopped(false);
            let handler = handler.clone();
            let slot = self.slots[key].clone();
            self.tasks.push(tokio::spawn(async move {
                if let Err(e) = handler.on_will_appear(&slot).await {
                    warn!(key, error = %e, "appear hook failed");
                }
            }));
        }
    }

    /// Route a classified gesture to the active scene's handler for the key,
    /// as a supervised fire-and-forget task. Errors stop at this boundary.
    pub fn dispatch(&mut self, key: usize, gesture: Gesture) {
        let Some(handler) = self.scenes.get(self.active).and_then(|s| s.get(key)) else {
            return;
        };
        let handler = handler.clone();
        let slot = self.slots[key].clone();
        // Completed callbacks leave finished handles behind; drop them
        // before tracking another.
        self.tasks.retain(|task| !task.is_finished());
        self.tasks.push(tokio::spawn(async move {
            let result = match gesture {
                Gesture::Down => handler.on_key_down(&slot).await,
                Gesture::Up => handler.on_key_up(&slot).await,
                Gesture::DoubleClick => handler.on_key_double_click(&slot).await,
                Gesture::LongPress => handler.on_key_long_pressed(&slot).await,
            };
            if let Err(e) = result {
                warn!(key, ?gesture, error = %e, "gesture callback failed");
            }
        }));
    }

    /// Re-push a key's current image, inset while the key is held. Skipped
    /// for stopped or empty handlers.
    pub fn redraw(&self, key: usize, pressed: bool) {
        let Some(handler) = self.scenes.get(self.active).and_then(|s| s.get(key)) else {
            return;
        };
        if handler.base().is_stopped() {
            return;
        }
        let visual = handler.base().visual();
        if visual.is_empty() {
            return;
        }
        let margins = if pressed {
            MARGINS_PRESSED
        } else {
            MARGINS_FLUSH
        };
        self.slots[key].render(&visual, margins);
    }

    /// Final teardown: cancel the active scene's tasks and fire its
    /// disappear hooks without entering another scene.
    pub fn shutdown(&mut self) {
        self.leave();
    }
}

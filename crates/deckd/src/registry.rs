use crate::handlers;
use crate::scene::Scene;
use anyhow::{bail, Context, Result};
use deckd_core::config::{Config, HandlerConfig};
use deckd_core::handler::Handler;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

pub type Factory = fn(&HandlerConfig) -> Result<Arc<dyn Handler>>;

/// Name → factory table for building handlers from scene config. Built at
/// startup; an unknown name is a fatal configuration error, raised before
/// any device is touched.
pub struct Registry {
    factories: HashMap<String, Factory>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("label", handlers::label::build);
        registry.register("page", handlers::page::build);
        registry.register("brightness", handlers::brightness::build);
        registry.register("uptime", handlers::uptime::build);
        registry.register("clock", handlers::clock::build);
        registry
    }

    pub fn register(&mut self, name: &str, factory: Factory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn build(&self, config: &HandlerConfig) -> Result<Arc<dyn Handler>> {
        match self.factories.get(config.kind.as_str()) {
            Some(factory) => factory(config),
            None => bail!("unknown handler type '{}'", config.kind),
        }
    }

    /// Build every scene, one handler instance per key. Scenes shorter than
    /// the key count are padded with blank keys; longer ones are truncated.
    pub fn build_scenes(&self, config: &Config) -> Result<Vec<Scene>> {
        let keys = config.general.keys;
        let mut scenes = Vec::new();
        for (scene_idx, scene_config) in config.scenes_or_default().iter().enumerate() {
            if scene_config.keys.len() > keys {
                warn!(
                    scene = scene_idx,
                    configured = scene_config.keys.len(),
                    keys,
                    "scene has more handlers than keys, extras ignored"
                );
            }
            let mut scene: Scene = Vec::with_capacity(keys);
            for (key_idx, handler_config) in scene_config.keys.iter().take(keys).enumerate() {
                let handler = self.build(handler_config).with_context(|| {
                    format!("building scene {scene_idx} key {key_idx}")
                })?;
                scene.push(handler);
            }
            while scene.len() < keys {
                scene.push(handlers::label::blank());
            }
            scenes.push(scene);
        }
        Ok(scenes)
    }
}

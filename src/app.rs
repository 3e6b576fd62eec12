use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::prelude::*;
use log::{error, info};
use winit::{event::VirtualKeyCode, event_loop::ControlFlow, window::Window};

use forest_avenue::{FrameTime, Scene, SceneConfig};

use crate::{
    renderer::Renderer,
    window::{HasSize, Size},
};

pub struct App {
    window: Window,
    scene: Scene,
    renderer: Renderer,
    started_at: Instant,
    last_frame_at: Instant,
    intro: Duration,
    intro_done: bool,
}

impl App {
    pub async fn new(window: Window, config: SceneConfig, seed: u64, intro: Duration) -> Result<Self> {
        let scene = Scene::new(config, seed, window.size().aspect_ratio());
        info!(
            "Scene ready: {} tree points, {} snow batches",
            scene.forest().tree().len(),
            scene.forest().snow().len()
        );

        let renderer = Renderer::new(&window, &scene).await?;

        let now = Instant::now();
        Ok(Self {
            window,
            scene,
            renderer,
            started_at: now,
            last_frame_at: now,
            intro,
            intro_done: false,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn resize(&mut self, size: Size) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.scene.set_aspect_ratio(size.aspect_ratio());
        self.renderer.resize(size);
    }

    pub fn on_key_up(&mut self, keycode: VirtualKeyCode, control_flow: &mut ControlFlow) {
        match keycode {
            VirtualKeyCode::Space => {
                if let Some(id) = self.scene.trigger_manual_burst() {
                    info!("Manual burst {:?}", id);
                }
            }
            VirtualKeyCode::F => {
                let enabled = !self.scene.fireworks_enabled();
                self.scene.set_fireworks_enabled(enabled);
            }
            VirtualKeyCode::Escape => *control_flow = ControlFlow::Exit,
            _ => (),
        }
    }

    pub fn render(&mut self) {
        let now = Instant::now();
        let frame = FrameTime {
            elapsed: now - self.started_at,
            delta: now - self.last_frame_at,
            wall_clock_ms: Local::now().timestamp_millis() as f64,
        };
        self.last_frame_at = now;

        if !self.intro_done && frame.elapsed >= self.intro {
            self.intro_done = true;
            self.scene.set_fireworks_enabled(true);
        }

        self.scene.tick(&frame);

        if let Err(e) = self.renderer.render(&self.scene) {
            error!("Skipping frame: {:#}", e);
        }
    }
}

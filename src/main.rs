use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;

use forest_avenue::{rng, SceneConfig};

mod app;
mod renderer;
mod window;

/// Snowy forest avenue with fireworks.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML file overriding the default scene parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for every random choice in the scene
    #[arg(short, long)]
    seed: Option<u64>,

    /// Enable fireworks immediately
    #[arg(long)]
    no_intro: bool,

    /// Milliseconds before fireworks are enabled
    #[arg(long, default_value_t = 4000)]
    intro_ms: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SceneConfig::from_file(path)?,
        None => SceneConfig::default(),
    };
    let seed = args.seed.unwrap_or_else(rng::time_seed);
    let intro = if args.no_intro {
        Duration::ZERO
    } else {
        Duration::from_millis(args.intro_ms)
    };

    let event_loop = winit::event_loop::EventLoop::new();
    let window = winit::window::WindowBuilder::new()
        .with_title("Forest Avenue")
        .with_inner_size(winit::dpi::LogicalSize {
            width: 1280,
            height: 720,
        })
        .build(&event_loop)
        .context("Failed to build window")?;

    let mut app = pollster::block_on(app::App::new(window, config, seed, intro))?;

    event_loop.run(move |e, _, control_flow| {
        use winit::{
            event::{ElementState, Event, KeyboardInput, WindowEvent},
            event_loop::ControlFlow,
        };

        *control_flow = ControlFlow::Poll;

        match e {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
                WindowEvent::Resized(size) => app.resize(size.into()),
                WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                    app.resize((*new_inner_size).into())
                }
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Released,
                            virtual_keycode: Some(keycode),
                            ..
                        },
                    ..
                } => app.on_key_up(keycode, control_flow),
                _ => (),
            },
            Event::MainEventsCleared => {
                app.window().request_redraw();
            }
            Event::RedrawRequested(..) => {
                app.render();
            }
            _ => (),
        }
    });
}

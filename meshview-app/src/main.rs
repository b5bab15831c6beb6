//! meshview entry point
//!
//! ```bash
//! cargo run -p meshview-app
//! cargo run -p meshview-app -- part.msh
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use meshview_app::{MenuAction, MeshViewer, RenderConfig, RfdDialog, Viewer};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

#[derive(Parser)]
#[command(name = "meshview", about = "Desktop viewer for Gmsh meshes", version)]
struct Cli {
    /// Mesh file to open at startup
    mesh: Option<PathBuf>,

    /// Window title
    #[arg(long, default_value = "Mesh viewer")]
    title: String,

    /// Window width in logical pixels
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Window height in logical pixels
    #[arg(long, default_value_t = 480)]
    height: u32,
}

/// Event-loop driver: creates the window and shell on resume, then routes
/// window events to them.
struct App {
    cli: Cli,
    shell: Option<MeshViewer<Viewer, RfdDialog>>,
}

impl App {
    fn new(cli: Cli) -> Self {
        Self { cli, shell: None }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.shell.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(&self.cli.title)
            .with_inner_size(LogicalSize::new(
                self.cli.width as f64,
                self.cli.height as f64,
            ));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let viewer = match pollster::block_on(Viewer::new(window, RenderConfig::default())) {
            Ok(viewer) => viewer,
            Err(e) => {
                log::error!("failed to initialize renderer: {e}");
                event_loop.exit();
                return;
            }
        };

        let mut shell = MeshViewer::new(viewer, RfdDialog::new());
        if let Some(path) = self.cli.mesh.take() {
            if let Err(e) = shell.open_path(&path) {
                log::error!("failed to open {}: {e}", path.display());
            }
        }
        self.shell = Some(shell);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(shell) = self.shell.as_mut() else {
            return;
        };

        if shell.display_mut().handle_window_event(&event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(new_size) => shell.display_mut().resize(new_size),
            WindowEvent::RedrawRequested => match shell.display_mut().render() {
                Ok(Some(MenuAction::Open)) => {
                    if let Err(e) = shell.open_file() {
                        log::error!("open failed: {e}");
                    }
                }
                Ok(Some(MenuAction::Quit)) => event_loop.exit(),
                Ok(None) => {}
                Err(e) => log::error!("render error: {e}"),
            },
            _ => {}
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(cli);
    event_loop.run_app(&mut app)?;
    Ok(())
}

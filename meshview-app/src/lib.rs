//! The meshview application shell
//!
//! One window, one render surface, one "File → Open" action: pick a Gmsh
//! file, read it, parse it, show it. The shell itself ([`MeshViewer`]) only
//! talks to the file dialog and the render surface through the [`OpenDialog`]
//! and [`MeshDisplay`] traits, so its open-and-display flow is testable
//! without a GPU or a desktop session.

pub mod app;
pub mod camera;
pub mod dialog;
pub mod viewer;

pub use app::{MeshDisplay, MeshViewer};
pub use camera::OrbitCamera;
pub use dialog::{OpenDialog, RfdDialog};
pub use viewer::{MenuAction, RenderConfig, Viewer};

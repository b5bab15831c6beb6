//! The application shell: routes the "Open" action to the mesh reader and
//! the render surface.

use crate::dialog::OpenDialog;
use meshview_core::{Result, SurfaceMesh};
use meshview_io::MshReader;
use std::fs;
use std::path::{Path, PathBuf};

/// Render-widget capability as the shell sees it
pub trait MeshDisplay {
    /// Replace the displayed mesh
    fn update_mesh(&mut self, mesh: &SurfaceMesh) -> Result<()>;

    /// Make the render surface visible
    fn show(&mut self);
}

/// The application shell.
///
/// Owns the render surface and the file dialog, and remembers the last path
/// that was opened successfully.
pub struct MeshViewer<D, G> {
    display: D,
    dialog: G,
    open_file_path: Option<PathBuf>,
}

impl<D: MeshDisplay, G: OpenDialog> MeshViewer<D, G> {
    pub fn new(display: D, dialog: G) -> Self {
        Self {
            display,
            dialog,
            open_file_path: None,
        }
    }

    /// Handle the "File → Open" menu action.
    ///
    /// A cancelled dialog is not an error: nothing is read and no state
    /// changes.
    pub fn open_file(&mut self) -> Result<()> {
        match self.dialog.pick_file() {
            Some(path) => self.open_path(&path),
            None => {
                log::debug!("file dialog cancelled");
                Ok(())
            }
        }
    }

    /// Read, parse, and display the mesh at `path`.
    ///
    /// The stored path is updated only once every step has succeeded, so a
    /// failed open leaves the previous value intact.
    pub fn open_path(&mut self, path: &Path) -> Result<()> {
        let data = fs::read(path)?;
        let block = MshReader::parse(&data)?;
        log::info!(
            "loaded {}: {} nodes, {} elements",
            path.display(),
            block.node_count(),
            block.element_count()
        );

        let mut surface = block.to_surface();
        surface.compute_vertex_normals();
        self.display.update_mesh(&surface)?;
        self.display.show();

        self.open_file_path = Some(path.to_path_buf());
        Ok(())
    }

    /// The most recently opened path, if any open has succeeded
    pub fn open_file_path(&self) -> Option<&Path> {
        self.open_file_path.as_deref()
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }
}

//! File-picker seam for the application shell

use std::path::PathBuf;

/// A source of user-selected file paths.
///
/// `None` means the user cancelled the dialog; the shell must not touch the
/// filesystem in that case.
pub trait OpenDialog {
    fn pick_file(&mut self) -> Option<PathBuf>;
}

/// Native file dialog backed by rfd
#[derive(Debug, Default)]
pub struct RfdDialog;

impl RfdDialog {
    pub fn new() -> Self {
        Self
    }
}

impl OpenDialog for RfdDialog {
    fn pick_file(&mut self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Open mesh")
            .add_filter("Gmsh mesh", &["msh"])
            .pick_file()
    }
}

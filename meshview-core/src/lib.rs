//! Core data structures for meshview
//!
//! This crate provides the mesh representations shared by the reader and the
//! viewer: the structured [`MeshBlock`] produced from a mesh file and the
//! renderable [`SurfaceMesh`] derived from it, along with the common error
//! type.

pub mod error;
pub mod mesh;

pub use error::*;
pub use mesh::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix4, Point3, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// Common result type for meshview operations
pub type Result<T> = std::result::Result<T, Error>;

//! Orbit camera for the mesh view

use meshview_core::{Point3f, Vector3f};
use nalgebra::{Matrix4, Perspective3};

// Keep the orbit away from the poles so the up vector stays usable.
const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// A target-orbiting 3D camera
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub position: Point3f,
    pub target: Point3f,
    pub up: Vector3f,
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl OrbitCamera {
    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Perspective3::new(self.aspect_ratio, self.fov, self.near, self.far).into_inner()
    }

    /// Rotate the camera around the target, keeping its distance
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        let offset = self.position - self.target;
        let radius = offset.norm();
        if radius <= f32::EPSILON {
            return;
        }

        let mut yaw = offset.z.atan2(offset.x);
        let mut pitch = (offset.y / radius).clamp(-1.0, 1.0).asin();
        yaw += delta_yaw;
        pitch = (pitch + delta_pitch).clamp(-MAX_PITCH, MAX_PITCH);

        let direction = Vector3f::new(
            pitch.cos() * yaw.cos(),
            pitch.sin(),
            pitch.cos() * yaw.sin(),
        );
        self.position = self.target + direction * radius;
    }

    /// Slide the camera and target in the view plane
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let forward = (self.target - self.position).normalize();
        let right = forward.cross(&self.up).normalize();
        let up = right.cross(&forward);
        let distance = (self.target - self.position).norm();

        let offset = (right * -dx + up * dy) * distance;
        self.position += offset;
        self.target += offset;
    }

    /// Move toward (positive) or away from (negative) the target
    pub fn zoom(&mut self, amount: f32) {
        let offset = self.position - self.target;
        let radius = (offset.norm() * (1.0 - amount)).max(self.near * 2.0);
        self.position = self.target + offset.normalize() * radius;
    }

    /// Place the camera so the given bounding box fills the view.
    ///
    /// The current viewing direction is preserved; only target, distance,
    /// and clip planes change.
    pub fn frame(&mut self, min: Point3f, max: Point3f) {
        let center = nalgebra::center(&min, &max);
        let radius = ((max - min).norm() * 0.5).max(1e-3);

        let offset = self.position - self.target;
        let direction = if offset.norm() > f32::EPSILON {
            offset.normalize()
        } else {
            Vector3f::new(1.0, 1.0, 1.0).normalize()
        };

        let distance = radius / (self.fov * 0.5).sin() * 1.1;
        self.target = center;
        self.position = center + direction * distance;
        self.near = (radius * 0.01).min(0.1);
        self.far = distance + radius * 10.0;
    }

    /// Return to the default pose, keeping the aspect ratio
    pub fn reset(&mut self) {
        let aspect_ratio = self.aspect_ratio;
        *self = Self::default();
        self.aspect_ratio = aspect_ratio;
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            position: Point3f::new(3.0, 3.0, 5.0),
            target: Point3f::new(0.0, 0.0, 0.0),
            up: Vector3f::new(0.0, 1.0, 0.0),
            fov: std::f32::consts::FRAC_PI_4,
            aspect_ratio: 4.0 / 3.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn distance(camera: &OrbitCamera) -> f32 {
        (camera.position - camera.target).norm()
    }

    #[test]
    fn orbit_preserves_distance() {
        let mut camera = OrbitCamera::default();
        let before = distance(&camera);
        camera.orbit(0.7, -0.3);
        assert_relative_eq!(distance(&camera), before, epsilon = 1e-4);
    }

    #[test]
    fn orbit_pitch_is_clamped() {
        let mut camera = OrbitCamera::default();
        for _ in 0..100 {
            camera.orbit(0.0, 0.5);
        }
        let offset = camera.position - camera.target;
        let pitch = (offset.y / offset.norm()).asin();
        assert!(pitch <= MAX_PITCH + 1e-4);
    }

    #[test]
    fn zoom_moves_toward_target() {
        let mut camera = OrbitCamera::default();
        let before = distance(&camera);
        camera.zoom(0.2);
        assert!(distance(&camera) < before);
        camera.zoom(-0.5);
        assert!(distance(&camera) > before * 0.5);
    }

    #[test]
    fn pan_keeps_view_direction() {
        let mut camera = OrbitCamera::default();
        let before = (camera.target - camera.position).normalize();
        camera.pan(0.3, -0.2);
        let after = (camera.target - camera.position).normalize();
        assert_relative_eq!(before.dot(&after), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn frame_centers_and_fits_the_box() {
        let mut camera = OrbitCamera::default();
        let min = Point3f::new(-2.0, -2.0, -2.0);
        let max = Point3f::new(2.0, 2.0, 2.0);
        camera.frame(min, max);

        assert_relative_eq!(camera.target.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(camera.target.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(camera.target.z, 0.0, epsilon = 1e-6);

        let radius = (max - min).norm() * 0.5;
        assert!(distance(&camera) > radius);
        assert!(camera.far > distance(&camera));
    }

    #[test]
    fn reset_restores_pose_but_not_aspect() {
        let mut camera = OrbitCamera::default();
        camera.aspect_ratio = 2.5;
        camera.orbit(1.0, 0.4);
        camera.zoom(0.5);
        camera.reset();

        let fresh = OrbitCamera::default();
        assert_relative_eq!(camera.position.x, fresh.position.x, epsilon = 1e-6);
        assert_eq!(camera.aspect_ratio, 2.5);
    }
}

use glam::{Mat4, Vec3};

use crate::model::CameraState;
use crate::scene::SceneObject;

/// Extra distance factor so framed objects get breathing room at the edges.
const FRAME_MARGIN: f32 = 1.2;
/// Fallback distance for degenerate bounding volumes (single point, zero size).
const MIN_FRAME_DISTANCE: f32 = 8.0;
/// Viewing direction used when the camera has no usable direction of its own.
const DEFAULT_VIEW_DIR: Vec3 = Vec3::new(0.577_35, 0.577_35, 0.577_35);

/// Orbit camera: the position is derived from yaw/pitch/distance around the
/// target point.
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    aspect: f32,

    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
}

impl Camera {
    pub fn new() -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 60.0_f32.to_radians(),
            near: 0.1,
            far: 2000.0,
            aspect: 16.0 / 9.0,
            yaw: 0.0,
            pitch: 0.0,
            distance: 1.0,
        };
        camera.apply_state(&CameraState::default());
        camera
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if height > 0.0 {
            self.aspect = width / height;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Orbit around the target by yaw/pitch deltas (in radians).
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch =
            (self.pitch + delta_pitch).clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
        self.update_position();
    }

    /// Zoom by adjusting the orbit distance.
    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance - delta).max(0.5);
        self.update_position();
    }

    /// Pan the target (and camera) in the camera's local XY plane.
    pub fn pan(&mut self, delta_x: f32, delta_y: f32) {
        let forward = (self.target - self.position).normalize();
        let right = forward.cross(self.up).normalize();
        let cam_up = right.cross(forward).normalize();

        let offset = right * delta_x + cam_up * delta_y;
        self.target += offset;
        self.update_position();
    }

    /// The pose as the command history sees it.
    pub fn state(&self) -> CameraState {
        CameraState { position: self.position, look_at: self.target }
    }

    /// Adopt a committed pose, recalculating the orbit parameters from the
    /// raw position/look-at pair. The single programmatic entry point for
    /// undo/redo replay and framing.
    pub fn apply_state(&mut self, state: &CameraState) {
        self.position = state.position;
        self.target = state.look_at;
        let diff = self.position - self.target;
        self.distance = diff.length().max(0.5);
        self.pitch = (diff.y / self.distance).clamp(-1.0, 1.0).asin();
        self.yaw = diff.x.atan2(diff.z);
    }

    fn update_position(&mut self) {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.position = self.target + Vec3::new(x, y, z);
    }
}

/// Compute a pose that frames all given objects: look at the center of their
/// union bounds, retreating along the camera's current viewing direction far
/// enough for the whole volume to fit the field of view with a margin.
///
/// Returns `None` for an empty set. The result is not applied here — the
/// caller routes it through the same command path as user orbit, and must not
/// re-enter framing with it.
pub fn frame_objects(objects: &[&SceneObject], camera: &Camera) -> Option<CameraState> {
    let mut bounds = objects.first()?.aabb;
    for obj in &objects[1..] {
        bounds = bounds.union(&obj.aabb);
    }

    let center = bounds.center();
    let radius = bounds.size().length() * 0.5;

    let towards_camera = camera.position - camera.target;
    let dir = if towards_camera.length_squared() > 1e-6 {
        towards_camera.normalize()
    } else {
        DEFAULT_VIEW_DIR
    };

    let fit = radius / (camera.fov_y * 0.5).tan() * FRAME_MARGIN;
    let distance = fit.max(MIN_FRAME_DISTANCE);

    Some(CameraState { position: center + dir * distance, look_at: center })
}

use glam::{Mat4, Vec2, Vec3};
use voxelview_common::{CameraConfig, MoveDirection};

const PITCH_LIMIT: f32 = 89.0;

/// First-person fly camera.
///
/// Yaw, pitch and field of view are in degrees. `front` is derived from yaw
/// and pitch and is recomputed on every rotation; the view and projection
/// matrices are cached and rebuilt whenever their inputs change.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    yaw: f32,
    pitch: f32,
    front: Vec3,
    up: Vec3,
    speed: f32,
    sensitivity: f32,
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
    view: Mat4,
    projection: Mat4,
    last_cursor: Option<Vec2>,
    view_changed: bool,
    projection_changed: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), 1.0)
    }
}

impl Camera {
    pub fn new(position: Vec3, aspect: f32) -> Self {
        let mut cam = Self::default();
        cam.position = position;
        cam.set_projection(cam.fov, aspect, None, None);
        cam.refresh_view();
        cam
    }

    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        let mut cam = Self {
            position: Vec3::from_array(config.position),
            // -90 degrees of yaw faces -Z.
            yaw: -90.0,
            pitch: 0.0,
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            speed: config.speed,
            sensitivity: config.sensitivity,
            fov: config.fov,
            aspect,
            near: config.near,
            far: config.far,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            last_cursor: None,
            view_changed: true,
            projection_changed: true,
        };
        cam.update_front();
        cam.rebuild_projection();
        cam.refresh_view();
        cam
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.front.cross(self.up).normalize()
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.refresh_view();
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    /// Mouse-wheel speed change. Speed never drops below zero.
    pub fn adjust_speed(&mut self, offset: f32) {
        self.set_speed(self.speed + offset);
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity;
    }

    pub fn set_near_far(&mut self, near: f32, far: f32) {
        self.set_projection(self.fov, self.aspect, Some(near), Some(far));
    }

    /// Rebuild the perspective projection. `near`/`far` keep their current
    /// values when `None`.
    pub fn set_projection(&mut self, fov: f32, aspect: f32, near: Option<f32>, far: Option<f32>) {
        self.fov = fov;
        self.aspect = aspect;
        if let Some(near) = near {
            self.near = near;
        }
        if let Some(far) = far {
            self.far = far;
        }
        self.rebuild_projection();
        tracing::info!(
            fov = self.fov,
            aspect = self.aspect,
            near = self.near,
            far = self.far,
            "camera projection updated"
        );
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.set_projection(self.fov, aspect, None, None);
    }

    fn rebuild_projection(&mut self) {
        self.projection =
            Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far);
        self.projection_changed = true;
    }

    fn translate(&mut self, offset: Vec3) {
        self.position += offset;
        self.refresh_view();
    }

    pub fn forward(&mut self, delta: f32) {
        self.translate(self.front * self.speed * delta);
    }

    pub fn backward(&mut self, delta: f32) {
        self.translate(-self.front * self.speed * delta);
    }

    pub fn right_by(&mut self, delta: f32) {
        self.translate(self.right() * self.speed * delta);
    }

    pub fn left_by(&mut self, delta: f32) {
        self.translate(-self.right() * self.speed * delta);
    }

    pub fn up_by(&mut self, delta: f32) {
        self.translate(self.up * self.speed * delta);
    }

    pub fn down_by(&mut self, delta: f32) {
        self.translate(-self.up * self.speed * delta);
    }

    /// Move along `direction` by `speed * delta`.
    pub fn apply_impulse(&mut self, direction: MoveDirection, delta: f32) {
        match direction {
            MoveDirection::Forward => self.forward(delta),
            MoveDirection::Backward => self.backward(delta),
            MoveDirection::Left => self.left_by(delta),
            MoveDirection::Right => self.right_by(delta),
            MoveDirection::Up => self.up_by(delta),
            MoveDirection::Down => self.down_by(delta),
        }
    }

    /// Rotate by a mouse delta in pixels. Moving the mouse up (negative dy)
    /// pitches up.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch - dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_front();
        self.refresh_view();
    }

    /// Rotate from an absolute cursor position. The first position only
    /// seeds the tracker. Returns whether the camera rotated.
    pub fn track_cursor(&mut self, cursor: Vec2) -> bool {
        let last = self.last_cursor.replace(cursor);
        match last {
            Some(last) => {
                let delta = cursor - last;
                self.rotate(delta.x, delta.y);
                true
            }
            None => false,
        }
    }

    /// Forget the tracked cursor, e.g. after the cursor was released.
    pub fn reset_cursor(&mut self) {
        self.last_cursor = None;
    }

    fn update_front(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            pitch.cos() * yaw.cos(),
            pitch.sin(),
            pitch.cos() * yaw.sin(),
        )
        .normalize();
    }

    fn refresh_view(&mut self) {
        self.view = Mat4::look_at_rh(self.position, self.position + self.front, self.up);
        self.view_changed = true;
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Whether the view changed since the last call. Clears the flag.
    pub fn take_view_changed(&mut self) -> bool {
        std::mem::take(&mut self.view_changed)
    }

    /// Whether the projection changed since the last call. Clears the flag.
    pub fn take_projection_changed(&mut self) -> bool {
        std::mem::take(&mut self.projection_changed)
    }

    /// Whether `point` lies within the view cone, with a 5 degree margin on
    /// the field of view.
    pub fn is_point_in_fov(&self, point: Vec3) -> bool {
        let dir = (point - self.position).normalize_or_zero();
        if dir == Vec3::ZERO {
            return true;
        }
        let angle = self.front.dot(dir).clamp(-1.0, 1.0).acos().to_degrees();
        angle < (self.fov + 5.0) / 2.0
    }
}

use crate::app::Vec3;

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Points closer than this to the camera plane are culled instead of
/// projected; the perspective divide blows up as depth approaches zero.
pub const NEAR_PLANE: f32 = 0.1;

const FOCAL_FACTOR: f32 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub x: i32,
    pub y: i32,
    pub depth: f32,
    /// Pixels per world unit at this depth; quads scale by it.
    pub scale: f32,
}

/// Yaw-only perspective projection. `camera_yaw` of zero looks down
/// negative Z; positive yaw turns toward positive X. Returns `None` for
/// points at or behind the near plane.
pub fn project_point(
    world: Vec3,
    camera_position: Vec3,
    camera_yaw: f32,
    viewport: Viewport,
) -> Option<ProjectedPoint> {
    let delta = world.sub(camera_position);
    let (sin_yaw, cos_yaw) = camera_yaw.sin_cos();

    let view_x = delta.x * cos_yaw + delta.z * sin_yaw;
    let view_y = delta.y;
    let depth = delta.x * sin_yaw - delta.z * cos_yaw;

    if depth <= NEAR_PLANE {
        return None;
    }

    let focal = viewport.height as f32 * FOCAL_FACTOR;
    let scale = focal / depth;
    let x = viewport.width as f32 * 0.5 + view_x * scale;
    let y = viewport.height as f32 * 0.5 - view_y * scale;

    Some(ProjectedPoint {
        x: x.round() as i32,
        y: y.round() as i32,
        depth,
        scale,
    })
}

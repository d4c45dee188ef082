/// Camera-relative movement direction in the ground plane, normalized.
/// `camera_yaw` rotates the input so "forward" is away from the camera.
fn movement_direction(input: &InputSnapshot, camera_yaw: f32) -> Vec3 {
    let mut right = 0.0f32;
    let mut forward = 0.0f32;

    if input.is_down(InputAction::MoveRight) {
        right += 1.0;
    }
    if input.is_down(InputAction::MoveLeft) {
        right -= 1.0;
    }
    if input.is_down(InputAction::MoveForward) {
        forward += 1.0;
    }
    if input.is_down(InputAction::MoveBackward) {
        forward -= 1.0;
    }

    let len_sq = right * right + forward * forward;
    if len_sq <= 0.0 {
        return Vec3::new(0.0, 0.0, 0.0);
    }
    let inv_len = len_sq.sqrt().recip();
    right *= inv_len;
    forward *= inv_len;

    // Right is (cos, 0, sin) and forward is (sin, 0, -cos) for a camera
    // looking along yaw, matching the renderer's view transform.
    let (sin, cos) = camera_yaw.sin_cos();
    Vec3::new(
        right * cos + forward * sin,
        0.0,
        right * sin - forward * cos,
    )
}

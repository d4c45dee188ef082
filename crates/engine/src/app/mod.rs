mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use input::{ActionStates, EdgeTrigger, InputAction};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use rendering::{
    project_point, BattlePanel, InventoryPanel, PanelRect, PartyPanel, ProjectedPoint, Renderer,
    StoryPanel, UiSnapshot, Viewport,
};
pub use scene::{
    BobMotion, CameraMode, Entity, EntityId, EntityIdAllocator, FollowCamera, InputSnapshot,
    PressAction, RenderableDesc, RenderableKind, Scene, SceneCommand, SceneWorld, Transform, Vec3,
};

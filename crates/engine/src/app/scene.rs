use super::input::{ActionStates, InputAction};
use super::rendering::UiSnapshot;

use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    /// Unload the scene, wipe the world and load it again from scratch.
    /// The only path by which gameplay state resets.
    HardReset,
}

/// One-tick button presses. Latched on the key-down edge and consumed by the
/// next tick snapshot; holding a key never retriggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PressAction {
    Jump,
    Interact,
    ToggleInventory,
    ToggleCameraMode,
    ToggleParty,
    Recruit,
    ToggleMenu,
    BattleAttack,
    BattlePotion,
    BattleFlee,
    Save,
    Load,
}

pub(crate) const PRESS_ACTION_COUNT: usize = 12;

pub(crate) const ALL_PRESS_ACTIONS: [PressAction; PRESS_ACTION_COUNT] = [
    PressAction::Jump,
    PressAction::Interact,
    PressAction::ToggleInventory,
    PressAction::ToggleCameraMode,
    PressAction::ToggleParty,
    PressAction::Recruit,
    PressAction::ToggleMenu,
    PressAction::BattleAttack,
    PressAction::BattlePotion,
    PressAction::BattleFlee,
    PressAction::Save,
    PressAction::Load,
];

impl PressAction {
    pub(crate) const fn index(self) -> usize {
        match self {
            PressAction::Jump => 0,
            PressAction::Interact => 1,
            PressAction::ToggleInventory => 2,
            PressAction::ToggleCameraMode => 3,
            PressAction::ToggleParty => 4,
            PressAction::Recruit => 5,
            PressAction::ToggleMenu => 6,
            PressAction::BattleAttack => 7,
            PressAction::BattlePotion => 8,
            PressAction::BattleFlee => 9,
            PressAction::Save => 10,
            PressAction::Load => 11,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    presses: [bool; PRESS_ACTION_COUNT],
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        actions: ActionStates,
        presses: [bool; PRESS_ACTION_COUNT],
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            actions,
            presses,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn pressed(&self, action: PressAction) -> bool {
        self.presses[action.index()]
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_pressed(mut self, action: PressAction) -> Self {
        self.presses[action.index()] = true;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn add(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn scale(self, factor: f32) -> Vec3 {
        Vec3::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Distance ignoring the vertical axis. Interaction triggers measure in
    /// the ground plane so a stone on a ledge still reads as "near".
    pub fn horizontal_distance_to(self, other: Vec3) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    pub fn distance_to(self, other: Vec3) -> f32 {
        self.sub(other).length()
    }

    /// Exponential smoothing toward `target`. `alpha` is the per-step blend
    /// factor in `[0, 1]`.
    pub fn lerp_toward(self, target: Vec3, alpha: f32) -> Vec3 {
        self.add(target.sub(self).scale(alpha.clamp(0.0, 1.0)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Transform {
    pub position: Vec3,
    pub rotation_y: f32,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation_y: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderableKind {
    /// Axis-aligned box drawn as a distance-scaled quad.
    Box,
    /// Always faces the camera; used for vegetation and star hints.
    Billboard,
}

#[derive(Debug, Clone)]
pub struct RenderableDesc {
    pub kind: RenderableKind,
    pub color: [u8; 3],
    pub half_extents: Vec3,
    pub debug_name: &'static str,
}

/// Vertical bob applied by the ambient animation pass. `base_y` anchors the
/// motion so repeated ticks never drift the entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BobMotion {
    pub amplitude: f32,
    pub frequency_hz: f32,
    pub base_y: f32,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub transform: Transform,
    pub renderable: RenderableDesc,
    pub visible: bool,
    /// Radians per second around Y; zero for static geometry.
    pub spin_rate: f32,
    pub bob: Option<BobMotion>,
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CameraMode {
    #[default]
    Follow,
    Free,
}

#[derive(Debug, Clone, Copy)]
pub struct FollowCamera {
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 14.0, 20.0),
            target: Vec3::default(),
        }
    }
}

impl FollowCamera {
    /// Yaw of the view direction in the ground plane, radians. Zero looks
    /// down negative Z.
    pub fn yaw(&self) -> f32 {
        let dir = self.target.sub(self.position);
        dir.x.atan2(-dir.z)
    }
}

#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
    camera: FollowCamera,
    camera_mode: CameraMode,
}

impl SceneWorld {
    pub fn spawn(&mut self, transform: Transform, renderable: RenderableDesc) -> EntityId {
        self.spawn_with_motion(transform, renderable, 0.0, None)
    }

    pub fn spawn_with_motion(
        &mut self,
        transform: Transform,
        renderable: RenderableDesc,
        spin_rate: f32,
        bob: Option<BobMotion>,
    ) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            transform,
            renderable,
            visible: true,
            spin_rate,
            bob,
        });
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.entities.iter().any(|entity| entity.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|entity| entity.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort_by_key(|id| id.0);
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            self.entities.retain(|entity| {
                pending
                    .binary_search_by_key(&entity.id.0, |id| id.0)
                    .is_err()
            });
            self.pending_spawns.retain(|entity| {
                pending
                    .binary_search_by_key(&entity.id.0, |id| id.0)
                    .is_err()
            });
            self.pending_despawns.clear();
        }

        if !self.pending_spawns.is_empty() {
            self.entities.append(&mut self.pending_spawns);
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
        self.camera = FollowCamera::default();
        self.camera_mode = CameraMode::default();
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn set_visible(&mut self, id: EntityId, visible: bool) -> bool {
        match self.find_entity_mut(id) {
            Some(entity) => {
                entity.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn camera(&self) -> &FollowCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut FollowCamera {
        &mut self.camera
    }

    pub fn camera_mode(&self) -> CameraMode {
        self.camera_mode
    }

    pub fn set_camera_mode(&mut self, mode: CameraMode) {
        self.camera_mode = mode;
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn unload(&mut self, world: &mut SceneWorld);
    fn ui_snapshot(&self, _world: &SceneWorld) -> UiSnapshot {
        UiSnapshot::default()
    }
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

pub(crate) struct SceneHost {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneHost {
    pub(crate) fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            is_loaded: false,
        }
    }

    pub(crate) fn load(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load(&mut self.world);
        self.world.apply_pending();
        self.is_loaded = true;
    }

    pub(crate) fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        self.scene.update(fixed_dt_seconds, input, &mut self.world)
    }

    pub(crate) fn apply_pending(&mut self) {
        self.world.apply_pending();
    }

    pub(crate) fn hard_reset(&mut self) {
        info!("scene_hard_reset");
        self.scene.unload(&mut self.world);
        self.world.clear();
        self.is_loaded = false;
        self.load();
    }

    pub(crate) fn world(&self) -> &SceneWorld {
        &self.world
    }

    pub(crate) fn ui_snapshot(&self) -> UiSnapshot {
        self.scene.ui_snapshot(&self.world)
    }

    pub(crate) fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholder(name: &'static str) -> RenderableDesc {
        RenderableDesc {
            kind: RenderableKind::Box,
            color: [200, 200, 200],
            half_extents: Vec3::new(0.5, 0.5, 0.5),
            debug_name: name,
        }
    }

    #[test]
    fn allocator_ids_are_monotonic_and_never_reused() {
        let mut allocator = EntityIdAllocator::default();
        let a = allocator.allocate();
        let b = allocator.allocate();
        let c = allocator.allocate();
        assert!(a.0 < b.0 && b.0 < c.0);
    }

    #[test]
    fn spawn_is_deferred_until_apply_pending() {
        let mut world = SceneWorld::default();
        world.spawn(Transform::default(), placeholder("a"));
        assert_eq!(world.entity_count(), 0);

        world.apply_pending();
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn despawn_of_unknown_id_is_rejected() {
        let mut world = SceneWorld::default();
        assert!(!world.despawn(EntityId(99)));
    }

    #[test]
    fn duplicate_despawn_is_idempotent() {
        let mut world = SceneWorld::default();
        let id = world.spawn(Transform::default(), placeholder("a"));
        world.apply_pending();

        assert!(world.despawn(id));
        assert!(world.despawn(id));
        world.apply_pending();
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn despawn_cancels_a_pending_spawn() {
        let mut world = SceneWorld::default();
        let id = world.spawn(Transform::default(), placeholder("a"));
        assert!(world.despawn(id));

        world.apply_pending();
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn set_visible_hides_without_despawning() {
        let mut world = SceneWorld::default();
        let id = world.spawn(Transform::default(), placeholder("vampire"));
        world.apply_pending();

        assert!(world.set_visible(id, false));
        let entity = world.find_entity(id).expect("entity kept");
        assert!(!entity.visible);
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn set_visible_on_unknown_id_reports_false() {
        let mut world = SceneWorld::default();
        assert!(!world.set_visible(EntityId(7), true));
    }

    #[test]
    fn clear_resets_entities_and_camera_mode() {
        let mut world = SceneWorld::default();
        world.spawn(Transform::default(), placeholder("a"));
        world.apply_pending();
        world.set_camera_mode(CameraMode::Free);

        world.clear();
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.camera_mode(), CameraMode::Follow);
    }

    #[test]
    fn clear_does_not_reset_id_allocation() {
        let mut world = SceneWorld::default();
        let first = world.spawn(Transform::default(), placeholder("a"));
        world.clear();
        let second = world.spawn(Transform::default(), placeholder("b"));
        assert!(second.0 > first.0);
    }

    #[test]
    fn input_snapshot_builder_sets_presses_and_holds() {
        let input = InputSnapshot::empty()
            .with_action_down(InputAction::MoveForward, true)
            .with_pressed(PressAction::Interact)
            .with_window_size((640, 360));

        assert!(input.is_down(InputAction::MoveForward));
        assert!(!input.is_down(InputAction::Sprint));
        assert!(input.pressed(PressAction::Interact));
        assert!(!input.pressed(PressAction::Jump));
        assert_eq!(input.window_size(), (640, 360));
    }

    #[test]
    fn press_action_indices_are_unique() {
        let mut seen = [false; PRESS_ACTION_COUNT];
        for action in ALL_PRESS_ACTIONS {
            assert!(!seen[action.index()]);
            seen[action.index()] = true;
        }
    }

    #[test]
    fn vec3_horizontal_distance_ignores_height() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 50.0, 4.0);
        assert!((a.horizontal_distance_to(b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn vec3_lerp_toward_clamps_alpha() {
        let from = Vec3::new(0.0, 0.0, 0.0);
        let to = Vec3::new(10.0, 0.0, 0.0);
        let stepped = from.lerp_toward(to, 2.0);
        assert!((stepped.x - 10.0).abs() < 1e-6);
    }

    #[test]
    fn follow_camera_yaw_faces_target() {
        let camera = FollowCamera {
            position: Vec3::new(0.0, 10.0, 20.0),
            target: Vec3::new(0.0, 0.0, 0.0),
        };
        // Looking down negative Z is yaw zero.
        assert!(camera.yaw().abs() < 1e-6);
    }

    struct CountingScene {
        loads: u32,
        unloads: u32,
    }

    impl Scene for CountingScene {
        fn load(&mut self, world: &mut SceneWorld) {
            self.loads += 1;
            world.spawn(Transform::default(), placeholder("counted"));
        }

        fn update(
            &mut self,
            _fixed_dt_seconds: f32,
            _input: &InputSnapshot,
            _world: &mut SceneWorld,
        ) -> SceneCommand {
            SceneCommand::None
        }

        fn unload(&mut self, _world: &mut SceneWorld) {
            self.unloads += 1;
        }
    }

    #[test]
    fn host_load_is_idempotent() {
        let mut host = SceneHost::new(Box::new(CountingScene {
            loads: 0,
            unloads: 0,
        }));
        host.load();
        host.load();
        assert_eq!(host.world().entity_count(), 1);
    }

    #[test]
    fn host_hard_reset_unloads_and_rebuilds() {
        let mut host = SceneHost::new(Box::new(CountingScene {
            loads: 0,
            unloads: 0,
        }));
        host.load();
        host.hard_reset();

        assert_eq!(host.world().entity_count(), 1);
    }
}

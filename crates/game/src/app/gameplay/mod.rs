use std::fs;
use std::path::PathBuf;

use engine::{
    BattlePanel, BobMotion, CameraMode, EntityId, InputAction, InputSnapshot, InventoryPanel,
    PartyPanel, PlayerModelConfig, PressAction, RenderableDesc, RenderableKind, Scene,
    SceneCommand, SceneWorld, StoryPanel, Transform, UiSnapshot, Vec3,
};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const MOVE_SPEED_UNITS_PER_SECOND: f32 = 12.0;
const SPRINT_MULTIPLIER: f32 = 1.8;
const CROUCH_MULTIPLIER: f32 = 0.5;
const JUMP_VELOCITY_UNITS_PER_SECOND: f32 = 15.0;
const GRAVITY_UNITS_PER_SECOND_SQUARED: f32 = -36.0;
const CLIMB_SPEED_UNITS_PER_SECOND: f32 = 6.0;
const GROUND_Y: f32 = 0.0;
const PLAYER_STAND_HEIGHT: f32 = 4.0;
const PLAYER_CROUCH_HEIGHT: f32 = 1.0;

const PLAYER_MAX_HEALTH: u32 = 100;
const PLAYER_ATTACK: u32 = 35;
const PLAYER_DEFENSE: u32 = 10;
const PLAYER_MAX_STAMINA: f32 = 100.0;
const STAMINA_DRAIN_PER_SECOND: f32 = 20.0;
const STAMINA_REGEN_PER_SECOND: f32 = 10.0;

const VAMPIRE_NAME: &str = "Vampire Lord";
const VAMPIRE_MAX_HEALTH: u32 = 80;
const VAMPIRE_ATTACK: u32 = 20;
const VAMPIRE_DEFENSE: u32 = 5;
const BOSS_NAME: &str = "Velkisus";
const BOSS_MAX_HEALTH: u32 = 500;
const BOSS_ATTACK: u32 = 40;
const BOSS_DEFENSE: u32 = 15;

const DAMAGE_JITTER_MIN: i32 = -3;
const DAMAGE_JITTER_MAX: i32 = 2;
const POTION_HEAL_AMOUNT: u32 = 40;
const COUNTER_ATTACK_DELAY_SECONDS: f32 = 0.5;
const ENEMY_FLASH_SECONDS: f32 = 0.15;
const FLEE_RETREAT_UNITS: f32 = 2.0;

const INVENTORY_SLOT_COUNT: usize = 20;
const STEEL_SWORD_DAMAGE: u32 = 35;

const STORY_TRIGGER_DISTANCE: f32 = 5.0;
const NPC_TRIGGER_DISTANCE: f32 = 5.0;
const DOOR_TRIGGER_DISTANCE: f32 = 7.0;
const TOWER_TRIGGER_DISTANCE: f32 = 10.0;
const VAMPIRE_AGGRO_DISTANCE: f32 = 6.0;

const WORLD_HALF_EXTENT: f32 = 250.0;
const DOOR_EDGE_OFFSET: f32 = 240.0;
const MOUNTAIN_COUNT: u32 = 20;
const VEGETATION_COUNT: u32 = 100;
const TOWER_SEGMENT_COUNT: u32 = 100;
const TOWER_BASE_POSITION: Vec3 = Vec3::new(0.0, 0.0, 50.0);
const TOWER_SPIN_RADIANS_PER_SECOND: f32 = 0.06;

const CAMERA_FOLLOW_ALPHA: f32 = 0.12;
const CAMERA_OFFSET_UP: f32 = 10.0;
const CAMERA_OFFSET_BACK: f32 = 20.0;
const FREE_CAMERA_ORBIT_RADIUS: f32 = 25.0;
const FREE_CAMERA_ORBIT_SPEED_RADIANS_PER_SECOND: f32 = 1.5;

const LOADING_SECONDS: f32 = 3.0;
const WALK_CYCLE_HZ: f32 = 1.6;

const WORLD_SEED: u64 = 0x5eed_0001;

const SAVE_VERSION: u32 = 1;
const SAVE_FILE_NAME: &str = "towerbound.save.json";

include!("types.rs");
include!("battle.rs");
include!("builders.rs");
include!("systems.rs");
include!("scene_state.rs");
include!("scene_impl.rs");
include!("util.rs");

pub(crate) fn build_scene(save_dir: PathBuf, model: Option<PlayerModelConfig>) -> Box<dyn Scene> {
    Box::new(GameplayScene::new(save_dir.join(SAVE_FILE_NAME), model))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameplaySystemId {
    Movement,
    Physics,
    Climbing,
    Proximity,
    Interaction,
    BattleTimers,
    Ambient,
    Camera,
}

impl GameplaySystemId {
    #[cfg(test)]
    fn name(self) -> &'static str {
        match self {
            Self::Movement => "Movement",
            Self::Physics => "Physics",
            Self::Climbing => "Climbing",
            Self::Proximity => "Proximity",
            Self::Interaction => "Interaction",
            Self::BattleTimers => "BattleTimers",
            Self::Ambient => "Ambient",
            Self::Camera => "Camera",
        }
    }
}

const GAMEPLAY_SYSTEM_ORDER: [GameplaySystemId; 8] = [
    GameplaySystemId::Movement,
    GameplaySystemId::Physics,
    GameplaySystemId::Climbing,
    GameplaySystemId::Proximity,
    GameplaySystemId::Interaction,
    GameplaySystemId::BattleTimers,
    GameplaySystemId::Ambient,
    GameplaySystemId::Camera,
];

struct GameplaySystemContext<'a> {
    fixed_dt_seconds: f32,
    input: &'a InputSnapshot,
    world: &'a mut SceneWorld,
    session: &'a mut GameSession,
    climbable_walls: &'a [ClimbableWall],
    player_entity: Option<EntityId>,
    rng: &'a mut Xoshiro256PlusPlus,
    events: &'a mut GameplayEventBus,
    walk_phase: &'a mut f32,
    ambient_time: &'a mut f32,
    free_camera_angle: &'a mut f32,
    player_defeated: &'a mut bool,
}

#[derive(Default)]
struct GameplaySystemsHost {
    last_tick_order: Vec<GameplaySystemId>,
}

impl GameplaySystemsHost {
    #[allow(clippy::too_many_arguments)]
    fn run_once_per_tick(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
        session: &mut GameSession,
        climbable_walls: &[ClimbableWall],
        player_entity: Option<EntityId>,
        rng: &mut Xoshiro256PlusPlus,
        events: &mut GameplayEventBus,
        walk_phase: &mut f32,
        ambient_time: &mut f32,
        free_camera_angle: &mut f32,
        player_defeated: &mut bool,
    ) {
        self.last_tick_order.clear();
        for system_id in GAMEPLAY_SYSTEM_ORDER {
            self.last_tick_order.push(system_id);
            let mut context = GameplaySystemContext {
                fixed_dt_seconds,
                input,
                world: &mut *world,
                session: &mut *session,
                climbable_walls,
                player_entity,
                rng: &mut *rng,
                events: &mut *events,
                walk_phase: &mut *walk_phase,
                ambient_time: &mut *ambient_time,
                free_camera_angle: &mut *free_camera_angle,
                player_defeated: &mut *player_defeated,
            };
            self.run_system(system_id, &mut context);
        }
    }

    fn run_movement_system(&self, context: &mut GameplaySystemContext<'_>) {
        let session = &mut *context.session;
        if session.in_battle() || session.story_open.is_some() {
            session.is_sprinting = false;
            return;
        }

        session.is_crouching =
            context.input.is_down(InputAction::Crouch) && !session.is_climbing;
        let wants_sprint = context.input.is_down(InputAction::Sprint);
        session.is_sprinting = wants_sprint && session.stamina > 0.0 && !session.is_crouching;

        let yaw = context.world.camera().yaw();
        let direction = movement_direction(context.input, yaw);
        let moving = direction.length() > 0.0;

        if moving && !session.is_climbing {
            let mut speed = MOVE_SPEED_UNITS_PER_SECOND;
            if session.is_sprinting {
                speed *= SPRINT_MULTIPLIER;
            }
            if session.is_crouching {
                speed *= CROUCH_MULTIPLIER;
            }
            let step = direction.scale(speed * context.fixed_dt_seconds);
            session.player_position.x = (session.player_position.x + step.x)
                .clamp(-WORLD_HALF_EXTENT, WORLD_HALF_EXTENT);
            session.player_position.z = (session.player_position.z + step.z)
                .clamp(-WORLD_HALF_EXTENT, WORLD_HALF_EXTENT);
            *context.walk_phase +=
                WALK_CYCLE_HZ * std::f32::consts::TAU * context.fixed_dt_seconds;
        }

        if session.is_sprinting && moving {
            session.stamina = (session.stamina
                - STAMINA_DRAIN_PER_SECOND * context.fixed_dt_seconds)
                .max(0.0);
        } else {
            session.stamina = (session.stamina
                + STAMINA_REGEN_PER_SECOND * context.fixed_dt_seconds)
                .min(PLAYER_MAX_STAMINA);
        }
    }

    fn run_physics_system(&self, context: &mut GameplaySystemContext<'_>) {
        let session = &mut *context.session;
        if session.is_climbing {
            return;
        }

        let may_jump =
            session.is_grounded && !session.in_battle() && session.story_open.is_none();
        if may_jump && context.input.pressed(PressAction::Jump) {
            session.player_velocity_y = JUMP_VELOCITY_UNITS_PER_SECOND;
            session.is_grounded = false;
        }

        session.player_velocity_y +=
            GRAVITY_UNITS_PER_SECOND_SQUARED * context.fixed_dt_seconds;
        session.player_position.y += session.player_velocity_y * context.fixed_dt_seconds;

        if session.player_position.y <= GROUND_Y {
            session.player_position.y = GROUND_Y;
            session.player_velocity_y = 0.0;
            session.is_grounded = true;
        } else {
            session.is_grounded = false;
        }
    }

    fn run_climbing_system(&self, context: &mut GameplaySystemContext<'_>) {
        let session = &mut *context.session;
        let forward_held = context.input.is_down(InputAction::MoveForward);
        let adjacent = context
            .climbable_walls
            .iter()
            .find(|wall| wall.is_adjacent(session.player_position))
            .copied();

        if session.is_climbing {
            match adjacent {
                Some(wall) if forward_held => {
                    session.player_position.y +=
                        CLIMB_SPEED_UNITS_PER_SECOND * context.fixed_dt_seconds;
                    session.player_velocity_y = 0.0;
                    // Crested the wall; gravity takes over from here.
                    if session.player_position.y >= wall.top_y() {
                        session.is_climbing = false;
                    }
                }
                _ => session.is_climbing = false,
            }
            return;
        }

        if forward_held && adjacent.is_some() && session.is_grounded && !session.in_battle() {
            session.is_climbing = true;
            session.is_grounded = false;
        }
    }

    fn run_proximity_system(&self, context: &mut GameplaySystemContext<'_>) {
        let session = &mut *context.session;
        session.nearest_interactive = session.registry.nearest_in_range(session.player_position);

        if session.in_battle() || session.story_open.is_some() {
            return;
        }
        let ambush = session.enemies.iter().position(|enemy| {
            enemy.alive
                && enemy.kind == EnemyKind::FieldVampire
                && session
                    .player_position
                    .horizontal_distance_to(enemy.home_position)
                    <= VAMPIRE_AGGRO_DISTANCE
        });
        if let Some(enemy_index) = ambush {
            session.start_battle(enemy_index, context.events);
        }
    }

    fn run_interaction_system(&self, context: &mut GameplaySystemContext<'_>) {
        let session = &mut *context.session;

        if session.in_battle() {
            if context.input.pressed(PressAction::BattleAttack) {
                let jitter = roll_jitter(context.rng);
                session.battle_attack(jitter, context.events);
            } else if context.input.pressed(PressAction::BattlePotion) {
                session.battle_use_potion(context.events);
            } else if context.input.pressed(PressAction::BattleFlee) {
                session.battle_flee(context.events);
            }
            return;
        }

        if context.input.pressed(PressAction::ToggleInventory) {
            session.inventory_open = !session.inventory_open;
        }
        if context.input.pressed(PressAction::ToggleParty) {
            session.party_open = !session.party_open;
        }
        if context.input.pressed(PressAction::ToggleCameraMode) {
            let next = match context.world.camera_mode() {
                CameraMode::Follow => CameraMode::Free,
                CameraMode::Free => CameraMode::Follow,
            };
            context.world.set_camera_mode(next);
        }
        if context.input.pressed(PressAction::Recruit) && session.party.recruit("Lyra") {
            context.events.emit(GameplayEvent::Recruited {
                name: "Lyra".to_string(),
            });
        }

        if !context.input.pressed(PressAction::Interact) {
            return;
        }
        if session.story_open.is_some() {
            session.story_open = None;
            return;
        }
        let Some(object) = session.nearest_interactive else {
            return;
        };
        match object.kind {
            InteractionKind::Story { page_index } => {
                session.story_open = Some(page_index);
                session.story_page = session.story_page.max(page_index);
                context
                    .events
                    .emit(GameplayEvent::StoryOpened { page_index });
            }
            InteractionKind::Npc { name } => {
                context
                    .events
                    .emit(GameplayEvent::DialogueLine { speaker: name });
            }
            InteractionKind::Door { target_position } => {
                session.player_position.x = target_position.x;
                session.player_position.z = target_position.z;
                context
                    .events
                    .emit(GameplayEvent::DoorUsed { target_position });
            }
            InteractionKind::Tower => {
                let boss = session
                    .enemies
                    .iter()
                    .position(|enemy| enemy.alive && enemy.kind == EnemyKind::TowerBoss);
                if let Some(enemy_index) = boss {
                    session.start_battle(enemy_index, context.events);
                }
            }
        }
    }

    fn run_battle_timers_system(&self, context: &mut GameplaySystemContext<'_>) {
        if context
            .session
            .tick_battle_timers(context.fixed_dt_seconds, context.rng, context.events)
        {
            *context.player_defeated = true;
        }
    }

    fn run_ambient_system(&self, context: &mut GameplaySystemContext<'_>) {
        *context.ambient_time += context.fixed_dt_seconds;
        let now = *context.ambient_time;

        for entity in context.world.entities_mut() {
            if entity.spin_rate != 0.0 {
                entity.transform.rotation_y += entity.spin_rate * context.fixed_dt_seconds;
            }
            if let Some(bob) = entity.bob {
                entity.transform.position.y = bob.base_y
                    + bob.amplitude * (std::f32::consts::TAU * bob.frequency_hz * now).sin();
            }
        }

        for enemy in &context.session.enemies {
            if let Some(entity_id) = enemy.entity_id {
                context.world.set_visible(entity_id, enemy.alive);
            }
        }

        let Some(player_id) = context.player_entity else {
            return;
        };
        let Some(player) = context.world.find_entity_mut(player_id) else {
            return;
        };
        let session = &*context.session;
        let height = if session.is_crouching {
            PLAYER_CROUCH_HEIGHT
        } else {
            PLAYER_STAND_HEIGHT
        };
        player.renderable.half_extents.y = height / 2.0;
        let walk_bob = 0.15 * context.walk_phase.sin();
        player.transform.position = Vec3::new(
            session.player_position.x,
            session.player_position.y + height / 2.0 + walk_bob,
            session.player_position.z,
        );
    }

    fn run_camera_system(&self, context: &mut GameplaySystemContext<'_>) {
        let player = context.session.player_position;
        match context.world.camera_mode() {
            CameraMode::Follow => {
                let desired = Vec3::new(
                    player.x,
                    player.y + CAMERA_OFFSET_UP,
                    player.z + CAMERA_OFFSET_BACK,
                );
                let camera = context.world.camera_mut();
                camera.position = camera.position.lerp_toward(desired, CAMERA_FOLLOW_ALPHA);
                camera.target = Vec3::new(player.x, player.y + 2.0, player.z);
            }
            CameraMode::Free => {
                *context.free_camera_angle +=
                    FREE_CAMERA_ORBIT_SPEED_RADIANS_PER_SECOND * context.fixed_dt_seconds;
                let angle = *context.free_camera_angle;
                let camera = context.world.camera_mut();
                camera.position = Vec3::new(
                    player.x + FREE_CAMERA_ORBIT_RADIUS * angle.cos(),
                    player.y + CAMERA_OFFSET_UP,
                    player.z + FREE_CAMERA_ORBIT_RADIUS * angle.sin(),
                );
                camera.target = Vec3::new(player.x, player.y + 2.0, player.z);
            }
        }
    }

    fn run_system(&self, system_id: GameplaySystemId, context: &mut GameplaySystemContext<'_>) {
        match system_id {
            GameplaySystemId::Movement => self.run_movement_system(context),
            GameplaySystemId::Physics => self.run_physics_system(context),
            GameplaySystemId::Climbing => self.run_climbing_system(context),
            GameplaySystemId::Proximity => self.run_proximity_system(context),
            GameplaySystemId::Interaction => self.run_interaction_system(context),
            GameplaySystemId::BattleTimers => self.run_battle_timers_system(context),
            GameplaySystemId::Ambient => self.run_ambient_system(context),
            GameplaySystemId::Camera => self.run_camera_system(context),
        }
    }
}

const GROUND_COLOR: [u8; 3] = [34, 68, 34];
const MOUNTAIN_COLOR: [u8; 3] = [88, 84, 96];
const VEGETATION_COLOR: [u8; 3] = [40, 110, 44];
const WALL_COLOR: [u8; 3] = [120, 104, 84];
const TOWER_COLOR: [u8; 3] = [70, 70, 86];
const TOWER_ACCENT_COLOR: [u8; 3] = [120, 110, 60];
const TOWER_WINDOW_COLOR: [u8; 3] = [230, 210, 120];
const TOWER_TOP_COLOR: [u8; 3] = [140, 40, 40];
const STORY_STONE_COLOR: [u8; 3] = [190, 190, 210];
const DOOR_COLOR: [u8; 3] = [150, 110, 50];
const NPC_COLOR: [u8; 3] = [210, 180, 140];
const PLAYER_COLOR: [u8; 3] = [70, 130, 200];
const VAMPIRE_COLOR: [u8; 3] = [140, 20, 30];
const BOSS_COLOR: [u8; 3] = [40, 0, 60];

const TOWER_SEGMENT_HEIGHT: f32 = 5.0;
const TOWER_RADIUS: f32 = 12.0;

/// Axis-aligned region the climbing system treats as scalable.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ClimbableWall {
    center: Vec3,
    half_extents: Vec3,
}

impl ClimbableWall {
    /// Horizontal containment with a small reach margin; climbing starts
    /// when the player presses against the face, not inside the volume.
    fn is_adjacent(&self, position: Vec3) -> bool {
        const REACH: f32 = 1.5;
        (position.x - self.center.x).abs() <= self.half_extents.x + REACH
            && (position.z - self.center.z).abs() <= self.half_extents.z + REACH
    }

    fn top_y(&self) -> f32 {
        self.center.y + self.half_extents.y
    }
}

fn box_entity(color: [u8; 3], half_extents: Vec3, debug_name: &'static str) -> RenderableDesc {
    RenderableDesc {
        kind: RenderableKind::Box,
        color,
        half_extents,
        debug_name,
    }
}

fn billboard_entity(color: [u8; 3], half_extents: Vec3, debug_name: &'static str) -> RenderableDesc {
    RenderableDesc {
        kind: RenderableKind::Billboard,
        color,
        half_extents,
        debug_name,
    }
}

fn build_environment(world: &mut SceneWorld, rng: &mut Xoshiro256PlusPlus) -> Vec<ClimbableWall> {
    world.spawn(
        Transform::at(Vec3::new(0.0, -0.5, 0.0)),
        box_entity(
            GROUND_COLOR,
            Vec3::new(WORLD_HALF_EXTENT, 0.5, WORLD_HALF_EXTENT),
            "ground",
        ),
    );

    for _ in 0..MOUNTAIN_COUNT {
        let x = rng.gen_range(-WORLD_HALF_EXTENT..WORLD_HALF_EXTENT);
        let z = rng.gen_range(-WORLD_HALF_EXTENT..WORLD_HALF_EXTENT);
        let height = rng.gen_range(12.0..40.0);
        let width = rng.gen_range(8.0..24.0);
        // Keep the field near the spawn clear so peaks never bury the tower
        // approach.
        if x.abs() < 60.0 && z.abs() < 60.0 {
            continue;
        }
        world.spawn(
            Transform::at(Vec3::new(x, height / 2.0, z)),
            box_entity(
                MOUNTAIN_COLOR,
                Vec3::new(width, height / 2.0, width),
                "mountain",
            ),
        );
    }

    for _ in 0..VEGETATION_COUNT {
        let x = rng.gen_range(-WORLD_HALF_EXTENT..WORLD_HALF_EXTENT);
        let z = rng.gen_range(-WORLD_HALF_EXTENT..WORLD_HALF_EXTENT);
        let size = rng.gen_range(0.5..2.0);
        world.spawn(
            Transform::at(Vec3::new(x, size, z)),
            billboard_entity(VEGETATION_COLOR, Vec3::new(size, size, size), "vegetation"),
        );
    }

    let wall = ClimbableWall {
        center: Vec3::new(30.0, 10.0, 0.0),
        half_extents: Vec3::new(5.0, 10.0, 0.5),
    };
    world.spawn(
        Transform::at(wall.center),
        box_entity(WALL_COLOR, wall.half_extents, "climbable_wall"),
    );

    vec![wall]
}

fn build_tower(world: &mut SceneWorld, registry: &mut InteractionRegistry) {
    for segment in 0..TOWER_SEGMENT_COUNT {
        let color = if segment % 10 == 9 {
            TOWER_ACCENT_COLOR
        } else {
            TOWER_COLOR
        };
        let y = TOWER_BASE_POSITION.y + TOWER_SEGMENT_HEIGHT * (segment as f32 + 0.5);
        let position = Vec3::new(TOWER_BASE_POSITION.x, y, TOWER_BASE_POSITION.z);
        world.spawn_with_motion(
            Transform::at(position),
            box_entity(
                color,
                Vec3::new(TOWER_RADIUS, TOWER_SEGMENT_HEIGHT / 2.0, TOWER_RADIUS),
                "tower_segment",
            ),
            TOWER_SPIN_RADIANS_PER_SECOND,
            None,
        );

        if segment % 5 == 0 {
            world.spawn_with_motion(
                Transform::at(Vec3::new(
                    position.x,
                    y,
                    position.z - TOWER_RADIUS - 0.2,
                )),
                billboard_entity(
                    TOWER_WINDOW_COLOR,
                    Vec3::new(1.0, 1.5, 0.1),
                    "tower_window",
                ),
                TOWER_SPIN_RADIANS_PER_SECOND,
                None,
            );
        }
    }

    let top_y =
        TOWER_BASE_POSITION.y + TOWER_SEGMENT_HEIGHT * TOWER_SEGMENT_COUNT as f32 + 6.0;
    world.spawn_with_motion(
        Transform::at(Vec3::new(
            TOWER_BASE_POSITION.x,
            top_y,
            TOWER_BASE_POSITION.z,
        )),
        box_entity(TOWER_TOP_COLOR, Vec3::new(6.0, 6.0, 6.0), "tower_top"),
        TOWER_SPIN_RADIANS_PER_SECOND,
        None,
    );

    let gate_id = world.spawn(
        Transform::at(Vec3::new(
            TOWER_BASE_POSITION.x,
            2.5,
            TOWER_BASE_POSITION.z - TOWER_RADIUS,
        )),
        box_entity(DOOR_COLOR, Vec3::new(2.0, 2.5, 0.5), "tower_gate"),
    );
    registry.register(InteractiveObject {
        entity_id: gate_id,
        position: TOWER_BASE_POSITION,
        kind: InteractionKind::Tower,
        trigger_distance: TOWER_TRIGGER_DISTANCE + TOWER_RADIUS,
    });
}

fn build_npcs(world: &mut SceneWorld, registry: &mut InteractionRegistry) {
    const NPCS: [(&str, Vec3); 3] = [
        ("Yoonhwan", Vec3::new(-20.0, 0.0, -20.0)),
        ("Seoyul", Vec3::new(25.0, 0.0, -15.0)),
        ("Jay", Vec3::new(0.0, 0.0, 25.0)),
    ];

    for (name, position) in NPCS {
        let anchor = Vec3::new(position.x, 2.0, position.z);
        let id = world.spawn_with_motion(
            Transform::at(anchor),
            billboard_entity(NPC_COLOR, Vec3::new(1.0, 2.0, 1.0), "npc"),
            0.0,
            Some(BobMotion {
                amplitude: 0.3,
                frequency_hz: 0.5,
                base_y: anchor.y,
            }),
        );
        registry.register(InteractiveObject {
            entity_id: id,
            position,
            kind: InteractionKind::Npc { name },
            trigger_distance: NPC_TRIGGER_DISTANCE,
        });
    }
}

fn build_interactives(world: &mut SceneWorld, registry: &mut InteractionRegistry) {
    for page_index in 0..STORY_PAGES.len() {
        let position = Vec3::new(
            -30.0 + page_index as f32 * 20.0,
            2.0,
            -30.0 + page_index as f32 * 10.0,
        );
        let id = world.spawn_with_motion(
            Transform::at(position),
            box_entity(STORY_STONE_COLOR, Vec3::new(1.0, 1.5, 1.0), "story_stone"),
            0.4,
            Some(BobMotion {
                amplitude: 0.5,
                frequency_hz: 0.4,
                base_y: position.y,
            }),
        );
        registry.register(InteractiveObject {
            entity_id: id,
            position,
            kind: InteractionKind::Story { page_index },
            trigger_distance: STORY_TRIGGER_DISTANCE,
        });
    }

    // Each edge door teleports to just inside the opposite edge.
    const DOOR_INSET: f32 = 6.0;
    let doors = [
        Vec3::new(0.0, 0.0, -DOOR_EDGE_OFFSET),
        Vec3::new(0.0, 0.0, DOOR_EDGE_OFFSET),
        Vec3::new(-DOOR_EDGE_OFFSET, 0.0, 0.0),
        Vec3::new(DOOR_EDGE_OFFSET, 0.0, 0.0),
    ];
    for position in doors {
        let inward = (DOOR_EDGE_OFFSET - DOOR_INSET) / DOOR_EDGE_OFFSET;
        let target_position = Vec3::new(-position.x * inward, 0.0, -position.z * inward);
        let anchor = Vec3::new(position.x, 3.0, position.z);
        let id = world.spawn(
            Transform::at(anchor),
            box_entity(DOOR_COLOR, Vec3::new(2.5, 3.0, 0.5), "edge_door"),
        );
        registry.register(InteractiveObject {
            entity_id: id,
            position,
            kind: InteractionKind::Door { target_position },
            trigger_distance: DOOR_TRIGGER_DISTANCE,
        });
    }
}

fn build_enemies(world: &mut SceneWorld, enemies: &mut [EnemyState]) {
    for enemy in enemies.iter_mut() {
        let (color, position) = match enemy.kind {
            EnemyKind::FieldVampire => (VAMPIRE_COLOR, enemy.home_position),
            EnemyKind::TowerBoss => (BOSS_COLOR, enemy.home_position),
        };
        let anchor = Vec3::new(position.x, position.y + 2.0, position.z);
        let id = world.spawn_with_motion(
            Transform::at(anchor),
            billboard_entity(color, Vec3::new(1.2, 2.2, 1.2), "enemy"),
            0.0,
            Some(BobMotion {
                amplitude: 0.2,
                frequency_hz: 0.8,
                base_y: anchor.y,
            }),
        );
        enemy.entity_id = Some(id);
    }
}

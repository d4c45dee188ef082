/// All mutable gameplay state, owned by the scene and threaded through the
/// systems explicitly.
struct GameSession {
    player_stats: CombatStats,
    player_position: Vec3,
    player_velocity_y: f32,
    is_grounded: bool,
    is_sprinting: bool,
    is_crouching: bool,
    is_climbing: bool,
    stamina: f32,
    inventory: Inventory,
    party: Party,
    /// Highest story page the player has read; persisted in saves.
    story_page: usize,
    story_open: Option<usize>,
    inventory_open: bool,
    party_open: bool,
    menu_open: bool,
    enemies: Vec<EnemyState>,
    registry: InteractionRegistry,
    nearest_interactive: Option<InteractiveObject>,
    battle: Option<BattleSession>,
}

impl GameSession {
    fn new() -> Self {
        Self {
            player_stats: CombatStats::new(PLAYER_MAX_HEALTH, PLAYER_ATTACK, PLAYER_DEFENSE),
            player_position: Vec3::new(0.0, GROUND_Y, 0.0),
            player_velocity_y: 0.0,
            is_grounded: true,
            is_sprinting: false,
            is_crouching: false,
            is_climbing: false,
            stamina: PLAYER_MAX_STAMINA,
            inventory: Inventory::starting_loadout(),
            party: Party::starting_roster(),
            story_page: 0,
            story_open: None,
            inventory_open: false,
            party_open: false,
            menu_open: false,
            enemies: starting_enemies(),
            registry: InteractionRegistry::default(),
            nearest_interactive: None,
            battle: None,
        }
    }
}

fn starting_enemies() -> Vec<EnemyState> {
    let tower_top = Vec3::new(
        TOWER_BASE_POSITION.x,
        TOWER_SEGMENT_HEIGHT * TOWER_SEGMENT_COUNT as f32,
        TOWER_BASE_POSITION.z,
    );
    vec![
        EnemyState::new(
            VAMPIRE_NAME,
            EnemyKind::FieldVampire,
            CombatStats::new(VAMPIRE_MAX_HEALTH, VAMPIRE_ATTACK, VAMPIRE_DEFENSE),
            Vec3::new(18.0, 0.0, 30.0),
        ),
        EnemyState::new(
            BOSS_NAME,
            EnemyKind::TowerBoss,
            CombatStats::new(BOSS_MAX_HEALTH, BOSS_ATTACK, BOSS_DEFENSE),
            tower_top,
        ),
    ]
}

/// Fixed warm-up gate; input is ignored until the countdown finishes.
struct LoadingGate {
    remaining_seconds: f32,
}

impl LoadingGate {
    fn new() -> Self {
        Self {
            remaining_seconds: LOADING_SECONDS,
        }
    }

    fn tick(&mut self, fixed_dt_seconds: f32) {
        self.remaining_seconds = (self.remaining_seconds - fixed_dt_seconds).max(0.0);
    }

    fn is_open(&self) -> bool {
        self.remaining_seconds <= 0.0
    }

    fn progress(&self) -> f32 {
        if LOADING_SECONDS <= 0.0 {
            return 1.0;
        }
        1.0 - self.remaining_seconds / LOADING_SECONDS
    }
}

struct GameplayScene {
    session: GameSession,
    loading: LoadingGate,
    save_path: PathBuf,
    model: Option<PlayerModelConfig>,
    climbable_walls: Vec<ClimbableWall>,
    player_entity: Option<EntityId>,
    walk_phase: f32,
    ambient_time: f32,
    free_camera_angle: f32,
    rng: Xoshiro256PlusPlus,
    events: GameplayEventBus,
    systems_host: GameplaySystemsHost,
}

impl GameplayScene {
    fn new(save_path: PathBuf, model: Option<PlayerModelConfig>) -> Self {
        Self {
            session: GameSession::new(),
            loading: LoadingGate::new(),
            save_path,
            model,
            climbable_walls: Vec::new(),
            player_entity: None,
            walk_phase: 0.0,
            ambient_time: 0.0,
            free_camera_angle: 0.0,
            rng: Xoshiro256PlusPlus::seed_from_u64(WORLD_SEED),
            events: GameplayEventBus::default(),
            systems_host: GameplaySystemsHost::default(),
        }
    }

    fn reset_runtime_state(&mut self) {
        self.session = GameSession::new();
        self.loading = LoadingGate::new();
        self.climbable_walls.clear();
        self.player_entity = None;
        self.walk_phase = 0.0;
        self.ambient_time = 0.0;
        self.free_camera_angle = 0.0;
        self.rng = Xoshiro256PlusPlus::seed_from_u64(WORLD_SEED);
        self.events = GameplayEventBus::default();
    }

    fn capture_save_game(&self) -> SaveGame {
        let session = &self.session;
        SaveGame {
            save_version: SAVE_VERSION,
            player: SavedPlayer {
                health: session.player_stats.health,
                max_health: session.player_stats.max_health,
                attack: session.player_stats.attack,
                defense: session.player_stats.defense,
                position: SavedVec3::from_vec3(session.player_position),
            },
            inventory: session
                .inventory
                .items()
                .iter()
                .map(|item| SavedItem {
                    name: item.name.clone(),
                    kind: match item.kind {
                        ItemKind::Weapon { damage } => SavedItemKind::Weapon { damage },
                        ItemKind::Consumable {
                            effect: ConsumableEffect::Heal,
                        } => SavedItemKind::HealingConsumable,
                    },
                })
                .collect(),
            party: session.party.members().to_vec(),
            story_page: session.story_page,
            enemies: session
                .enemies
                .iter()
                .map(|enemy| SavedEnemy {
                    name: enemy.name.to_string(),
                    health: enemy.stats.health,
                    alive: enemy.alive,
                })
                .collect(),
        }
    }

    fn save_to_disk(&self) -> SaveLoadResult<()> {
        let save = self.capture_save_game();
        let json = serde_json::to_string_pretty(&save)
            .map_err(|error| format!("failed to serialize save: {error}"))?;
        fs::write(&self.save_path, json).map_err(|error| {
            format!(
                "failed to write save to {}: {error}",
                self.save_path.display()
            )
        })
    }

    fn load_and_validate_save(&self) -> SaveLoadResult<SaveGame> {
        let raw = fs::read_to_string(&self.save_path).map_err(|error| {
            format!(
                "failed to read save at {}: {error}",
                self.save_path.display()
            )
        })?;

        let mut deserializer = serde_json::Deserializer::from_str(&raw);
        let save: SaveGame = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|error| format!("malformed save ({}): {}", error.path(), error.inner()))?;

        if save.save_version != SAVE_VERSION {
            return Err(format!(
                "unsupported save_version {} (expected {})",
                save.save_version, SAVE_VERSION
            ));
        }
        if save.player.max_health == 0 {
            return Err("invalid save: player max_health is zero".to_string());
        }
        if save.story_page >= STORY_PAGES.len() {
            return Err(format!(
                "invalid save: story_page {} out of range",
                save.story_page
            ));
        }
        if save.inventory.len() > INVENTORY_SLOT_COUNT {
            return Err(format!(
                "invalid save: {} items exceed the {} slot inventory",
                save.inventory.len(),
                INVENTORY_SLOT_COUNT
            ));
        }
        Ok(save)
    }

    /// Applies a validated save; only called with the output of
    /// [`Self::load_and_validate_save`].
    fn apply_save_game(&mut self, save: SaveGame) -> SaveLoadResult<()> {
        let session = &mut self.session;

        session.player_stats = CombatStats {
            health: save.player.health.min(save.player.max_health),
            max_health: save.player.max_health,
            attack: save.player.attack,
            defense: save.player.defense,
        };
        session.player_position = save.player.position.to_vec3();
        session.player_velocity_y = 0.0;
        session.is_grounded = session.player_position.y <= GROUND_Y;
        session.is_climbing = false;

        let mut inventory = Inventory::default();
        for item in save.inventory {
            let restored = match item.kind {
                SavedItemKind::Weapon { damage } => InventoryItem {
                    name: item.name,
                    kind: ItemKind::Weapon { damage },
                },
                SavedItemKind::HealingConsumable => InventoryItem {
                    name: item.name,
                    kind: ItemKind::Consumable {
                        effect: ConsumableEffect::Heal,
                    },
                },
            };
            if !inventory.add(restored) {
                return Err("invalid save: inventory overflow".to_string());
            }
        }
        session.inventory = inventory;

        session.party = Party {
            members: save.party,
        };
        session.story_page = save.story_page;

        for saved in &save.enemies {
            let Some(enemy) = session
                .enemies
                .iter_mut()
                .find(|enemy| enemy.name == saved.name)
            else {
                return Err(format!("invalid save: unknown enemy {:?}", saved.name));
            };
            enemy.stats.health = saved.health.min(enemy.stats.max_health);
            enemy.alive = saved.alive && !enemy.stats.is_depleted();
        }

        session.battle = None;
        session.story_open = None;
        session.inventory_open = false;
        session.party_open = false;
        session.menu_open = false;
        Ok(())
    }

    fn build_ui_snapshot(&self) -> UiSnapshot {
        let mut ui = UiSnapshot::default();
        if !self.loading.is_open() {
            ui.loading_progress = Some(self.loading.progress());
            return ui;
        }

        let session = &self.session;
        ui.menu_open = session.menu_open;
        if session.inventory_open {
            ui.inventory = Some(InventoryPanel {
                slots_used: session.inventory.len(),
                slot_count: INVENTORY_SLOT_COUNT,
            });
        }
        if session.party_open {
            ui.party = Some(PartyPanel {
                member_health_fractions: session.party.members().iter().map(|_| 1.0).collect(),
            });
        }
        if let Some(page_index) = session.story_open {
            ui.story = Some(StoryPanel {
                page_index,
                page_count: STORY_PAGES.len(),
            });
        }
        if let Some(battle) = &session.battle {
            if let Some(enemy) = session.enemies.get(battle.enemy_index) {
                ui.battle = Some(BattlePanel {
                    player_health_fraction: session.player_stats.health_fraction(),
                    enemy_health_fraction: enemy.stats.health_fraction(),
                    enemy_flash: battle.enemy_flash_remaining > 0.0,
                });
            }
        }
        ui
    }
}

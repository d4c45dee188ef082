#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CombatStats {
    health: u32,
    max_health: u32,
    attack: u32,
    defense: u32,
}

impl CombatStats {
    fn new(max_health: u32, attack: u32, defense: u32) -> Self {
        Self {
            health: max_health,
            max_health,
            attack,
            defense,
        }
    }

    /// Saturating subtract; health never goes below zero.
    fn apply_damage(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
    }

    /// Capped at max; healing never overshoots.
    fn heal(&mut self, amount: u32) {
        self.health = self.health.saturating_add(amount).min(self.max_health);
    }

    fn is_depleted(&self) -> bool {
        self.health == 0
    }

    fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            return 0.0;
        }
        self.health as f32 / self.max_health as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnemyKind {
    FieldVampire,
    TowerBoss,
}

#[derive(Debug, Clone)]
struct EnemyState {
    name: &'static str,
    kind: EnemyKind,
    stats: CombatStats,
    alive: bool,
    home_position: Vec3,
    entity_id: Option<EntityId>,
}

impl EnemyState {
    fn new(name: &'static str, kind: EnemyKind, stats: CombatStats, home_position: Vec3) -> Self {
        Self {
            name,
            kind,
            stats,
            alive: true,
            home_position,
            entity_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsumableEffect {
    Heal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    Weapon { damage: u32 },
    Consumable { effect: ConsumableEffect },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InventoryItem {
    name: String,
    kind: ItemKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Inventory {
    items: Vec<InventoryItem>,
}

impl Inventory {
    fn starting_loadout() -> Self {
        let mut inventory = Self::default();
        let _ = inventory.add(InventoryItem {
            name: "Steel Sword".to_string(),
            kind: ItemKind::Weapon {
                damage: STEEL_SWORD_DAMAGE,
            },
        });
        let _ = inventory.add(InventoryItem {
            name: "Health Potion".to_string(),
            kind: ItemKind::Consumable {
                effect: ConsumableEffect::Heal,
            },
        });
        inventory
    }

    fn add(&mut self, item: InventoryItem) -> bool {
        if self.items.len() >= INVENTORY_SLOT_COUNT {
            return false;
        }
        self.items.push(item);
        true
    }

    fn take_first_consumable(&mut self, effect: ConsumableEffect) -> Option<InventoryItem> {
        let index = self.items.iter().position(|item| {
            matches!(item.kind, ItemKind::Consumable { effect: found } if found == effect)
        })?;
        Some(self.items.remove(index))
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn items(&self) -> &[InventoryItem] {
        &self.items
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StoryPage {
    title: &'static str,
    body: &'static str,
}

const STORY_PAGES: [StoryPage; 4] = [
    StoryPage {
        title: "CHAPTER 1 PROLOGUE",
        body: "A tower pierces the night sky; nobody who entered has returned.",
    },
    StoryPage {
        title: "CHAPTER 2 MILLIONS OF STABS (1)",
        body: "The field vampire guards the approach to the tower gate.",
    },
    StoryPage {
        title: "CHAPTER 3 MILLIONS OF STABS (2)",
        body: "Above the hundredth floor something watches the climbers.",
    },
    StoryPage {
        title: "CHAPTER 4 THE NIGHTMARE",
        body: "Velkisus waits at the top, and the tower keeps turning.",
    },
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Party {
    members: Vec<String>,
}

impl Party {
    fn starting_roster() -> Self {
        Self {
            members: vec!["Alden".to_string(), "Garrick".to_string()],
        }
    }

    /// Returns false when the member is already in the roster.
    fn recruit(&mut self, name: &str) -> bool {
        if self.members.iter().any(|member| member == name) {
            return false;
        }
        self.members.push(name.to_string());
        true
    }

    /// Swaps the chosen member into the active slot (index 0).
    fn promote(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.members.len() {
            return false;
        }
        self.members.swap(0, index);
        true
    }

    fn members(&self) -> &[String] {
        &self.members
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum InteractionKind {
    Story { page_index: usize },
    Door { target_position: Vec3 },
    Npc { name: &'static str },
    Tower,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct InteractiveObject {
    entity_id: EntityId,
    /// Anchor the trigger distance is measured against. Interactives never
    /// move, so the build-time position is authoritative.
    position: Vec3,
    kind: InteractionKind,
    trigger_distance: f32,
}

/// Filled once by the scene builders and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
struct InteractionRegistry {
    objects: Vec<InteractiveObject>,
}

impl InteractionRegistry {
    fn register(&mut self, object: InteractiveObject) {
        self.objects.push(object);
    }

    /// Nearest interactive whose trigger distance contains the position.
    /// Distance is measured in the ground plane.
    fn nearest_in_range(&self, position: Vec3) -> Option<InteractiveObject> {
        let mut best: Option<(f32, InteractiveObject)> = None;
        for object in &self.objects {
            let distance = position.horizontal_distance_to(object.position);
            if distance > object.trigger_distance {
                continue;
            }
            match best {
                Some((best_distance, _)) if best_distance <= distance => {}
                _ => best = Some((distance, *object)),
            }
        }
        best.map(|(_, object)| object)
    }

    fn len(&self) -> usize {
        self.objects.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum GameplayEvent {
    BattleStarted { enemy_name: &'static str },
    AttackLanded { target_name: String, amount: u32 },
    EnemyDefeated { name: &'static str },
    PlayerDefeated,
    FledBattle,
    PotionDrunk { healed: u32 },
    NoPotionsLeft,
    StoryOpened { page_index: usize },
    DialogueLine { speaker: &'static str },
    DoorUsed { target_position: Vec3 },
    Recruited { name: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct GameplayEventCounts {
    total: u32,
    battle: u32,
    notification: u32,
}

impl GameplayEventCounts {
    fn record(&mut self, event: &GameplayEvent) {
        self.total = self.total.saturating_add(1);
        match event {
            GameplayEvent::BattleStarted { .. }
            | GameplayEvent::AttackLanded { .. }
            | GameplayEvent::EnemyDefeated { .. }
            | GameplayEvent::PlayerDefeated
            | GameplayEvent::FledBattle => self.battle = self.battle.saturating_add(1),
            _ => self.notification = self.notification.saturating_add(1),
        }
    }
}

#[derive(Default)]
struct GameplayEventBus {
    current_tick_events: Vec<GameplayEvent>,
    last_tick_counts: GameplayEventCounts,
}

impl GameplayEventBus {
    fn emit(&mut self, event: GameplayEvent) {
        self.current_tick_events.push(event);
    }

    fn drain_current_tick(&mut self) -> Vec<GameplayEvent> {
        let mut counts = GameplayEventCounts::default();
        for event in &self.current_tick_events {
            counts.record(event);
        }
        self.last_tick_counts = counts;
        std::mem::take(&mut self.current_tick_events)
    }

    fn last_tick_counts(&self) -> GameplayEventCounts {
        self.last_tick_counts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct SavedVec3 {
    x: f32,
    y: f32,
    z: f32,
}

impl SavedVec3 {
    fn from_vec3(value: Vec3) -> Self {
        Self {
            x: value.x,
            y: value.y,
            z: value.z,
        }
    }

    fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum SavedItemKind {
    Weapon { damage: u32 },
    HealingConsumable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SavedItem {
    name: String,
    kind: SavedItemKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SavedEnemy {
    name: String,
    health: u32,
    alive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SavedPlayer {
    health: u32,
    max_health: u32,
    attack: u32,
    defense: u32,
    position: SavedVec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SaveGame {
    save_version: u32,
    player: SavedPlayer,
    inventory: Vec<SavedItem>,
    party: Vec<String>,
    story_page: usize,
    enemies: Vec<SavedEnemy>,
}

type SaveLoadResult<T> = Result<T, String>;

#[derive(Debug, Clone, Copy, PartialEq)]
struct BattleSession {
    enemy_index: usize,
    /// Seconds until the enemy counter-attack lands. Owned by the session
    /// and ticked by the fixed step, so fleeing or resolving the battle
    /// cancels it with the session.
    pending_counter: Option<f32>,
    enemy_flash_remaining: f32,
}

impl BattleSession {
    fn new(enemy_index: usize) -> Self {
        Self {
            enemy_index,
            pending_counter: None,
            enemy_flash_remaining: 0.0,
        }
    }
}

/// `max(0, attack - defense + jitter)`; jitter is rolled in `[-3, 2]` and
/// passed in explicitly so outcomes can be pinned.
fn damage_amount(attack: u32, defense: u32, jitter: i32) -> u32 {
    let raw = attack as i64 - defense as i64 + jitter as i64;
    raw.max(0) as u32
}

fn roll_jitter(rng: &mut Xoshiro256PlusPlus) -> i32 {
    rng.gen_range(DAMAGE_JITTER_MIN..=DAMAGE_JITTER_MAX)
}

impl GameSession {
    fn in_battle(&self) -> bool {
        self.battle.is_some()
    }

    fn battle_enemy_index(&self) -> Option<usize> {
        self.battle.as_ref().map(|session| session.enemy_index)
    }

    fn start_battle(&mut self, enemy_index: usize, events: &mut GameplayEventBus) -> bool {
        if self.battle.is_some() {
            return false;
        }
        let Some(enemy) = self.enemies.get(enemy_index) else {
            return false;
        };
        if !enemy.alive {
            return false;
        }
        let enemy_name = enemy.name;
        self.battle = Some(BattleSession::new(enemy_index));
        events.emit(GameplayEvent::BattleStarted { enemy_name });
        true
    }

    fn battle_attack(&mut self, jitter: i32, events: &mut GameplayEventBus) {
        let Some(enemy_index) = self.battle_enemy_index() else {
            return;
        };
        let attack = self.player_stats.attack;
        let Some(enemy) = self.enemies.get_mut(enemy_index) else {
            return;
        };
        if !enemy.alive {
            return;
        }

        let damage = damage_amount(attack, enemy.stats.defense, jitter);
        enemy.stats.apply_damage(damage);
        let defeated = enemy.stats.is_depleted();
        let enemy_name = enemy.name;
        events.emit(GameplayEvent::AttackLanded {
            target_name: enemy_name.to_string(),
            amount: damage,
        });

        if defeated {
            enemy.alive = false;
            events.emit(GameplayEvent::EnemyDefeated { name: enemy_name });
            if self.party.recruit(enemy_name) {
                events.emit(GameplayEvent::Recruited {
                    name: enemy_name.to_string(),
                });
            }
            // Victory ends the battle on the spot; no counter-attack.
            self.battle = None;
            return;
        }

        if let Some(session) = self.battle.as_mut() {
            session.enemy_flash_remaining = ENEMY_FLASH_SECONDS;
            session.pending_counter = Some(COUNTER_ATTACK_DELAY_SECONDS);
        }
    }

    fn battle_use_potion(&mut self, events: &mut GameplayEventBus) {
        if self.battle.is_none() {
            return;
        }
        if self
            .inventory
            .take_first_consumable(ConsumableEffect::Heal)
            .is_none()
        {
            events.emit(GameplayEvent::NoPotionsLeft);
            return;
        }

        let before = self.player_stats.health;
        self.player_stats.heal(POTION_HEAL_AMOUNT);
        events.emit(GameplayEvent::PotionDrunk {
            healed: self.player_stats.health - before,
        });

        if let Some(session) = self.battle.as_mut() {
            session.pending_counter = Some(COUNTER_ATTACK_DELAY_SECONDS);
        }
    }

    /// The scheduled counter. Returns true when it kills the player.
    fn battle_enemy_attack(&mut self, jitter: i32, events: &mut GameplayEventBus) -> bool {
        let Some(enemy_index) = self.battle_enemy_index() else {
            return false;
        };
        let Some(enemy) = self.enemies.get(enemy_index) else {
            return false;
        };
        if !enemy.alive {
            return false;
        }

        let damage = damage_amount(enemy.stats.attack, self.player_stats.defense, jitter);
        self.player_stats.apply_damage(damage);
        events.emit(GameplayEvent::AttackLanded {
            target_name: "player".to_string(),
            amount: damage,
        });

        if self.player_stats.is_depleted() {
            events.emit(GameplayEvent::PlayerDefeated);
            self.battle = None;
            return true;
        }
        false
    }

    fn battle_flee(&mut self, events: &mut GameplayEventBus) {
        if self.battle.take().is_none() {
            return;
        }
        // Dropping the session discards any pending counter-attack.
        self.player_position.x -= FLEE_RETREAT_UNITS;
        self.player_position.z -= FLEE_RETREAT_UNITS;
        events.emit(GameplayEvent::FledBattle);
    }

    /// Ticks the counter-attack countdown and the hit flash. Returns true
    /// when the elapsed counter kills the player.
    fn tick_battle_timers(
        &mut self,
        fixed_dt_seconds: f32,
        rng: &mut Xoshiro256PlusPlus,
        events: &mut GameplayEventBus,
    ) -> bool {
        let mut counter_elapsed = false;
        if let Some(session) = self.battle.as_mut() {
            session.enemy_flash_remaining =
                (session.enemy_flash_remaining - fixed_dt_seconds).max(0.0);
            if let Some(remaining) = session.pending_counter.as_mut() {
                *remaining -= fixed_dt_seconds;
                if *remaining <= 0.0 {
                    session.pending_counter = None;
                    counter_elapsed = true;
                }
            }
        }

        if counter_elapsed {
            let jitter = roll_jitter(rng);
            return self.battle_enemy_attack(jitter, events);
        }
        false
    }
}

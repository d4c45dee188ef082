impl Scene for GameplayScene {
    fn load(&mut self, world: &mut SceneWorld) {
        self.climbable_walls = build_environment(world, &mut self.rng);

        let mut registry = InteractionRegistry::default();
        build_tower(world, &mut registry);
        build_npcs(world, &mut registry);
        build_interactives(world, &mut registry);
        self.session.registry = registry;

        build_enemies(world, &mut self.session.enemies);

        let player_id = world.spawn(
            Transform::at(Vec3::new(0.0, PLAYER_STAND_HEIGHT / 2.0, 0.0)),
            box_entity(
                PLAYER_COLOR,
                Vec3::new(0.8, PLAYER_STAND_HEIGHT / 2.0, 0.8),
                "player",
            ),
        );
        self.player_entity = Some(player_id);
        world.apply_pending();

        if let Some(model) = &self.model {
            info!(
                source = %model.source,
                scale = model.scale,
                "player_model_bound"
            );
        }
        info!(
            entity_count = world.entity_count(),
            interactive_count = self.session.registry.len(),
            "scene_loaded"
        );
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        if !self.loading.is_open() {
            self.loading.tick(fixed_dt_seconds);
            if self.loading.is_open() {
                info!("loading_complete");
            }
            return SceneCommand::None;
        }

        if input.pressed(PressAction::Save) {
            match self.save_to_disk() {
                Ok(()) => info!(path = %self.save_path.display(), "save_written"),
                Err(error) => warn!(error = %error, "save_failed"),
            }
        }
        if input.pressed(PressAction::Load) {
            match self.load_and_validate_save() {
                Ok(save) => {
                    if let Err(error) = self.apply_save_game(save) {
                        warn!(error = %error, "load_apply_failed");
                    } else {
                        info!(path = %self.save_path.display(), "save_loaded");
                    }
                }
                Err(error) => warn!(error = %error, "load_failed"),
            }
        }

        if input.pressed(PressAction::ToggleMenu) {
            self.session.menu_open = !self.session.menu_open;
        }
        // The menu freezes the world; only the menu toggle above is live.
        if self.session.menu_open {
            return SceneCommand::None;
        }

        let mut player_defeated = false;
        self.systems_host.run_once_per_tick(
            fixed_dt_seconds,
            input,
            world,
            &mut self.session,
            &self.climbable_walls,
            self.player_entity,
            &mut self.rng,
            &mut self.events,
            &mut self.walk_phase,
            &mut self.ambient_time,
            &mut self.free_camera_angle,
            &mut player_defeated,
        );

        for event in self.events.drain_current_tick() {
            match event {
                GameplayEvent::BattleStarted { enemy_name } => {
                    info!(enemy = enemy_name, "battle_started");
                }
                GameplayEvent::AttackLanded {
                    target_name,
                    amount,
                } => {
                    info!(target = %target_name, amount, "attack_landed");
                }
                GameplayEvent::EnemyDefeated { name } => {
                    info!(enemy = name, "enemy_defeated");
                }
                GameplayEvent::PlayerDefeated => warn!("player_defeated"),
                GameplayEvent::FledBattle => info!("battle_fled"),
                GameplayEvent::PotionDrunk { healed } => info!(healed, "potion_drunk"),
                GameplayEvent::NoPotionsLeft => info!("no_potions_left"),
                GameplayEvent::StoryOpened { page_index } => {
                    if let Some(page) = STORY_PAGES.get(page_index) {
                        info!(
                            page = page_index,
                            title = page.title,
                            body = page.body,
                            "story_opened"
                        );
                    }
                }
                GameplayEvent::DialogueLine { speaker } => {
                    info!(speaker, "dialogue_line");
                }
                GameplayEvent::DoorUsed { target_position } => {
                    info!(
                        x = target_position.x,
                        z = target_position.z,
                        "door_used"
                    );
                }
                GameplayEvent::Recruited { name } => {
                    info!(member = %name, "party_recruited");
                }
            }
        }

        let counts = self.events.last_tick_counts();
        if counts.total > 0 {
            debug!(
                total = counts.total,
                battle = counts.battle,
                notification = counts.notification,
                "gameplay_events"
            );
        }

        if player_defeated {
            return SceneCommand::HardReset;
        }
        SceneCommand::None
    }

    fn unload(&mut self, world: &mut SceneWorld) {
        info!(entity_count = world.entity_count(), "scene_unload");
        self.reset_runtime_state();
    }

    fn ui_snapshot(&self, _world: &SceneWorld) -> UiSnapshot {
        self.build_ui_snapshot()
    }

    fn debug_title(&self, world: &SceneWorld) -> Option<String> {
        let session = &self.session;
        Some(format!(
            "Towerbound | Player ({:.1}, {:.1}) | HP {}/{} | Entities {}",
            session.player_position.x,
            session.player_position.z,
            session.player_stats.health,
            session.player_stats.max_health,
            world.entity_count()
        ))
    }
}

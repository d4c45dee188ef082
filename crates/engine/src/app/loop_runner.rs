use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::StartupError;

use super::input::{ActionStates, EdgeTrigger, InputAction};
use super::metrics::MetricsAccumulator;
use super::scene::{SceneHost, ALL_PRESS_ACTIONS, PRESS_ACTION_COUNT};
use super::{InputSnapshot, MetricsHandle, PressAction, Renderer, Scene, SceneCommand};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Towerbound".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            max_render_fps: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, scene: Box<dyn Scene>) -> Result<(), AppError> {
    let metrics_handle = MetricsHandle::default();
    run_app_with_metrics(config, scene, metrics_handle)
}

pub fn run_app_with_metrics(
    config: LoopConfig,
    scene: Box<dyn Scene>,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let mut host = SceneHost::new(scene);

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let window_for_loop = Arc::clone(&window);
    let mut renderer = Renderer::new(window).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let mut input_collector = InputCollector::new(config.window_width, config.window_height);

    host.load();
    info!(entity_count = host.world().entity_count(), "scene_loaded");

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut last_applied_title: Option<String> = None;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window_for_loop.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        input_collector.mark_quit_requested();
                        info!(reason = "window_close", "shutdown_requested");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        input_collector.set_window_size(new_size.width, new_size.height);
                        if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let size = window_for_loop.inner_size();
                        input_collector.set_window_size(size.width, size.height);
                        if let Err(error) = renderer.resize(size.width, size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        input_collector.handle_keyboard_input(&event);
                    }
                    WindowEvent::RedrawRequested => {
                        let now = Instant::now();
                        let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                        last_frame_instant = now;

                        let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
                        accumulator = accumulator.saturating_add(clamped_frame_dt);

                        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                        for _ in 0..step_plan.ticks_to_run {
                            let input_snapshot = input_collector.snapshot_for_tick();
                            let command = host.update(fixed_dt_seconds, &input_snapshot);
                            host.apply_pending();

                            if command == SceneCommand::HardReset {
                                host.hard_reset();
                                info!(
                                    entity_count = host.world().entity_count(),
                                    "scene_reloaded"
                                );
                            }
                            metrics_accumulator.record_tick();
                        }
                        accumulator = step_plan.remaining_accumulator;

                        if step_plan.dropped_backlog > Duration::ZERO {
                            metrics_accumulator.record_backlog_drop(step_plan.dropped_backlog);
                            warn!(
                                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                                max_ticks_per_frame, "sim_clamp_triggered"
                            );
                        }

                        // Single authoritative FPS cap sleep point for render pacing.
                        let elapsed_since_last_present =
                            Instant::now().saturating_duration_since(last_present_instant);
                        let cap_sleep =
                            compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                        if cap_sleep > Duration::ZERO {
                            thread::sleep(cap_sleep);
                        }

                        let ui = host.ui_snapshot();
                        if let Err(error) = renderer.render(host.world(), &ui) {
                            warn!(error = %error, "renderer_draw_failed");
                            window_target.exit();
                        }
                        last_present_instant = Instant::now();

                        let next_title = host.debug_title();
                        if next_title != last_applied_title {
                            if let Some(title) = &next_title {
                                window_for_loop.set_title(title);
                            } else {
                                window_for_loop.set_title(&config.window_title);
                            }
                            last_applied_title = next_title;
                        }
                        metrics_accumulator.record_frame(raw_frame_dt);

                        if let Some(snapshot) =
                            metrics_accumulator.maybe_snapshot(now, host.world().entity_count())
                        {
                            metrics_handle.publish(snapshot);
                            info!(
                                fps = snapshot.fps,
                                tps = snapshot.tps,
                                frame_time_ms = snapshot.frame_time_ms,
                                worst_frame_ms = snapshot.worst_frame_ms,
                                dropped_backlog_ms = snapshot.dropped_backlog_ms,
                                entity_count = snapshot.entity_count,
                                "loop_metrics"
                            );
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                window_for_loop.request_redraw();
            }
            Event::LoopExiting => {
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    action_states: ActionStates,
    press_triggers: [EdgeTrigger; PRESS_ACTION_COUNT],
    window_width: u32,
    window_height: u32,
}

impl InputCollector {
    fn new(window_width: u32, window_height: u32) -> Self {
        Self {
            window_width,
            window_height,
            ..Self::default()
        }
    }

    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &winit::event::KeyEvent) {
        let PhysicalKey::Code(code) = key_event.physical_key else {
            return;
        };
        let is_pressed = key_event.state == ElementState::Pressed;

        if let Some(action) = held_action_for_key(code) {
            self.action_states.set(action, is_pressed);
        }
        if let Some(action) = press_action_for_key(code) {
            self.press_triggers[action.index()].on_key(is_pressed);
        }
    }

    fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_width = width;
        self.window_height = height;
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let mut presses = [false; PRESS_ACTION_COUNT];
        for action in ALL_PRESS_ACTIONS {
            presses[action.index()] = self.press_triggers[action.index()].take_pressed();
        }
        InputSnapshot::new(
            self.quit_requested,
            self.action_states,
            presses,
            self.window_width,
            self.window_height,
        )
    }
}

fn held_action_for_key(code: KeyCode) -> Option<InputAction> {
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(InputAction::MoveForward),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(InputAction::MoveBackward),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(InputAction::MoveLeft),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(InputAction::MoveRight),
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Some(InputAction::Sprint),
        KeyCode::ControlLeft | KeyCode::ControlRight => Some(InputAction::Crouch),
        _ => None,
    }
}

// Escape maps to the menu toggle; closing the window is the only way out.
fn press_action_for_key(code: KeyCode) -> Option<PressAction> {
    match code {
        KeyCode::Space => Some(PressAction::Jump),
        KeyCode::KeyE => Some(PressAction::Interact),
        KeyCode::KeyI => Some(PressAction::ToggleInventory),
        KeyCode::KeyC => Some(PressAction::ToggleCameraMode),
        KeyCode::KeyV => Some(PressAction::ToggleParty),
        KeyCode::KeyP => Some(PressAction::Recruit),
        KeyCode::Escape => Some(PressAction::ToggleMenu),
        KeyCode::Digit1 => Some(PressAction::BattleAttack),
        KeyCode::Digit2 => Some(PressAction::BattlePotion),
        KeyCode::Digit3 => Some(PressAction::BattleFlee),
        KeyCode::F5 => Some(PressAction::Save),
        KeyCode::F9 => Some(PressAction::Load),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        let dropped_backlog = accumulator;
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_down(collector: &mut InputCollector, code: KeyCode) {
        if let Some(action) = held_action_for_key(code) {
            collector.action_states.set(action, true);
        }
        if let Some(action) = press_action_for_key(code) {
            collector.press_triggers[action.index()].on_key(true);
        }
    }

    fn key_up(collector: &mut InputCollector, code: KeyCode) {
        if let Some(action) = held_action_for_key(code) {
            collector.action_states.set(action, false);
        }
        if let Some(action) = press_action_for_key(code) {
            collector.press_triggers[action.index()].on_key(false);
        }
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        let raw_frame_dt = Duration::from_millis(600);

        assert_eq!(
            clamp_frame_delta(raw_frame_dt, max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(48), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_keeps_partial_accumulator() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(40), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 2);
        assert_eq!(result.remaining_accumulator, Duration::from_millis(8));
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn wasd_and_arrow_keys_map_to_move_actions() {
        let mut input = InputCollector::new(1280, 720);
        key_down(&mut input, KeyCode::KeyW);
        key_down(&mut input, KeyCode::ArrowLeft);

        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.is_down(InputAction::MoveForward));
        assert!(snapshot.is_down(InputAction::MoveLeft));
        assert!(!snapshot.is_down(InputAction::MoveBackward));
    }

    #[test]
    fn key_release_clears_held_state() {
        let mut input = InputCollector::new(1280, 720);
        key_down(&mut input, KeyCode::KeyD);
        key_up(&mut input, KeyCode::KeyD);

        let snapshot = input.snapshot_for_tick();
        assert!(!snapshot.is_down(InputAction::MoveRight));
    }

    #[test]
    fn sprint_and_crouch_modifiers_are_held_actions() {
        let mut input = InputCollector::new(1280, 720);
        key_down(&mut input, KeyCode::ShiftLeft);
        key_down(&mut input, KeyCode::ControlRight);

        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.is_down(InputAction::Sprint));
        assert!(snapshot.is_down(InputAction::Crouch));
    }

    #[test]
    fn interact_press_is_edge_triggered_for_single_tick() {
        let mut input = InputCollector::new(1280, 720);
        key_down(&mut input, KeyCode::KeyE);

        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();

        assert!(first.pressed(PressAction::Interact));
        assert!(!second.pressed(PressAction::Interact));
    }

    #[test]
    fn held_jump_does_not_spam_press_edges() {
        let mut input = InputCollector::new(1280, 720);

        key_down(&mut input, KeyCode::Space);
        let first = input.snapshot_for_tick();

        key_down(&mut input, KeyCode::Space);
        let second = input.snapshot_for_tick();

        key_up(&mut input, KeyCode::Space);
        key_down(&mut input, KeyCode::Space);
        let third = input.snapshot_for_tick();

        assert!(first.pressed(PressAction::Jump));
        assert!(!second.pressed(PressAction::Jump));
        assert!(third.pressed(PressAction::Jump));
    }

    #[test]
    fn escape_maps_to_menu_toggle_not_quit() {
        let mut input = InputCollector::new(1280, 720);
        key_down(&mut input, KeyCode::Escape);

        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.pressed(PressAction::ToggleMenu));
        assert!(!snapshot.quit_requested());
    }

    #[test]
    fn battle_keys_map_to_battle_presses() {
        let mut input = InputCollector::new(1280, 720);
        key_down(&mut input, KeyCode::Digit1);
        key_down(&mut input, KeyCode::Digit2);
        key_down(&mut input, KeyCode::Digit3);

        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.pressed(PressAction::BattleAttack));
        assert!(snapshot.pressed(PressAction::BattlePotion));
        assert!(snapshot.pressed(PressAction::BattleFlee));
    }

    #[test]
    fn save_and_load_keys_are_single_tick_edges() {
        let mut input = InputCollector::new(1280, 720);

        key_down(&mut input, KeyCode::F5);
        assert!(input.snapshot_for_tick().pressed(PressAction::Save));
        key_down(&mut input, KeyCode::F5);
        assert!(!input.snapshot_for_tick().pressed(PressAction::Save));
        key_up(&mut input, KeyCode::F5);
        key_down(&mut input, KeyCode::F5);
        assert!(input.snapshot_for_tick().pressed(PressAction::Save));

        key_down(&mut input, KeyCode::F9);
        assert!(input.snapshot_for_tick().pressed(PressAction::Load));
        key_down(&mut input, KeyCode::F9);
        assert!(!input.snapshot_for_tick().pressed(PressAction::Load));
    }

    #[test]
    fn snapshot_carries_window_size() {
        let mut input = InputCollector::new(1280, 720);
        let snapshot = input.snapshot_for_tick();
        assert_eq!(snapshot.window_size(), (1280, 720));

        input.set_window_size(640, 360);
        let resized = input.snapshot_for_tick();
        assert_eq!(resized.window_size(), (640, 360));
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        assert!(held_action_for_key(KeyCode::KeyZ).is_none());
        assert!(press_action_for_key(KeyCode::KeyZ).is_none());
    }

    #[test]
    fn target_frame_duration_none_when_cap_off() {
        assert_eq!(target_frame_duration(None), None);
    }

    #[test]
    fn target_frame_duration_for_60hz_is_expected() {
        let duration = target_frame_duration(Some(60)).expect("duration");
        assert!((duration.as_secs_f64() - (1.0 / 60.0)).abs() < 0.000_001);
    }

    #[test]
    fn compute_cap_sleep_zero_when_over_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(20), target_frame_duration(Some(60)));
        assert_eq!(sleep, Duration::ZERO);
    }

    #[test]
    fn compute_cap_sleep_positive_when_under_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(5), target_frame_duration(Some(60)));
        assert!(sleep > Duration::ZERO);
    }

    #[test]
    fn normalize_render_fps_cap_disables_zero() {
        assert_eq!(normalize_render_fps_cap(Some(0)), None);
        assert_eq!(normalize_render_fps_cap(Some(60)), Some(60));
    }
}

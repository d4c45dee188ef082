use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::{RenderableKind, SceneWorld};

use super::transform::project_point;
use super::Viewport;

const SKY_COLOR: [u8; 4] = [10, 26, 58, 255];
const GROUND_COLOR: [u8; 4] = [26, 58, 26, 255];
const STAR_COLOR: [u8; 4] = [235, 235, 220, 255];
const STAR_COUNT: u32 = 120;
const HORIZON_FRACTION: f32 = 0.55;

const PANEL_BG_COLOR: [u8; 4] = [18, 18, 26, 230];
const PANEL_BORDER_COLOR: [u8; 4] = [90, 90, 120, 255];
const HEALTH_BAR_BG_COLOR: [u8; 4] = [50, 20, 20, 255];
const PLAYER_HEALTH_COLOR: [u8; 4] = [70, 200, 90, 255];
const ENEMY_HEALTH_COLOR: [u8; 4] = [210, 60, 60, 255];
const ENEMY_FLASH_COLOR: [u8; 4] = [255, 255, 255, 255];
const SLOT_EMPTY_COLOR: [u8; 4] = [40, 40, 52, 255];
const SLOT_FILLED_COLOR: [u8; 4] = [120, 120, 160, 255];
const STORY_PAGE_COLOR: [u8; 4] = [200, 190, 150, 255];
const MENU_DIM_COLOR: [u8; 4] = [8, 8, 12, 255];
const LOADING_BAR_COLOR: [u8; 4] = [90, 140, 220, 255];

/// Everything the scene wants drawn on top of the world this frame.
/// `None`/`false` panels are simply not drawn. Text is out of scope for the
/// software renderer; prose goes to the log and the window title.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiSnapshot {
    /// Warm-up progress in `[0, 1]`; while present the world is covered by
    /// the loading screen.
    pub loading_progress: Option<f32>,
    pub menu_open: bool,
    pub inventory: Option<InventoryPanel>,
    pub party: Option<PartyPanel>,
    pub story: Option<StoryPanel>,
    pub battle: Option<BattlePanel>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BattlePanel {
    pub player_health_fraction: f32,
    pub enemy_health_fraction: f32,
    pub enemy_flash: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryPanel {
    pub slots_used: usize,
    pub slot_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartyPanel {
    pub member_health_fractions: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoryPanel {
    pub page_index: usize,
    pub page_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    draw_order: Vec<(f32, PanelRect, [u8; 4])>,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            draw_order: Vec::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn render(&mut self, world: &SceneWorld, ui: &UiSnapshot) -> Result<(), Error> {
        let viewport = self.viewport;
        self.collect_entity_quads(world);

        let frame = self.pixels.frame_mut();
        draw_background(frame, viewport);

        for (_, rect, color) in self.draw_order.iter().rev() {
            fill_rect(frame, viewport, *rect, *color);
        }

        draw_ui(frame, viewport, ui);
        self.pixels.render()
    }

    fn collect_entity_quads(&mut self, world: &SceneWorld) {
        self.draw_order.clear();
        let camera = world.camera();
        let camera_position = camera.position;
        let camera_yaw = camera.yaw();

        for entity in world.entities() {
            if !entity.visible {
                continue;
            }
            let Some(projected) = project_point(
                entity.transform.position,
                camera_position,
                camera_yaw,
                self.viewport,
            ) else {
                continue;
            };

            let extents = entity.renderable.half_extents;
            let half_width = match entity.renderable.kind {
                RenderableKind::Box => extents.x.max(extents.z),
                RenderableKind::Billboard => extents.x,
            };
            let width = ((half_width * 2.0) * projected.scale).round() as i32;
            let height = ((extents.y * 2.0) * projected.scale).round() as i32;
            if width < 1 || height < 1 {
                continue;
            }

            let [r, g, b] = entity.renderable.color;
            self.draw_order.push((
                projected.depth,
                PanelRect {
                    x: projected.x - width / 2,
                    y: projected.y - height / 2,
                    width,
                    height,
                },
                [r, g, b, 255],
            ));
        }

        // Painter's order: iterate far-to-near, so sort near-first and draw
        // the list reversed.
        self.draw_order
            .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    }
}

fn draw_background(frame: &mut [u8], viewport: Viewport) {
    let horizon = horizon_row(viewport);
    for row in 0..viewport.height as i32 {
        let color = if row < horizon { SKY_COLOR } else { GROUND_COLOR };
        fill_rect(
            frame,
            viewport,
            PanelRect {
                x: 0,
                y: row,
                width: viewport.width as i32,
                height: 1,
            },
            color,
        );
    }

    for index in 0..STAR_COUNT {
        let (x, y) = star_position(index, viewport);
        if y < horizon {
            fill_rect(
                frame,
                viewport,
                PanelRect {
                    x,
                    y,
                    width: 1,
                    height: 1,
                },
                STAR_COLOR,
            );
        }
    }
}

fn horizon_row(viewport: Viewport) -> i32 {
    (viewport.height as f32 * HORIZON_FRACTION) as i32
}

/// Fixed pseudo-random scatter; the same star stays put across frames and
/// resizes proportionally.
fn star_position(index: u32, viewport: Viewport) -> (i32, i32) {
    let hash = index.wrapping_mul(2_654_435_761);
    let x = (hash % viewport.width.max(1)) as i32;
    let y = ((hash >> 16) % viewport.height.max(1)) as i32;
    (x, y)
}

fn draw_ui(frame: &mut [u8], viewport: Viewport, ui: &UiSnapshot) {
    if let Some(progress) = ui.loading_progress {
        fill_rect(
            frame,
            viewport,
            PanelRect {
                x: 0,
                y: 0,
                width: viewport.width as i32,
                height: viewport.height as i32,
            },
            MENU_DIM_COLOR,
        );
        let bar = loading_bar_rect(viewport);
        fill_rect(frame, viewport, bar, HEALTH_BAR_BG_COLOR);
        draw_bar_fill(frame, viewport, bar, progress, LOADING_BAR_COLOR);
        return;
    }

    if let Some(battle) = &ui.battle {
        let panel = battle_panel_rect(viewport);
        draw_panel(frame, viewport, panel);

        let player_bar = bar_in_panel(panel, 0);
        fill_rect(frame, viewport, player_bar, HEALTH_BAR_BG_COLOR);
        draw_bar_fill(
            frame,
            viewport,
            player_bar,
            battle.player_health_fraction,
            PLAYER_HEALTH_COLOR,
        );

        let enemy_bar = bar_in_panel(panel, 1);
        fill_rect(frame, viewport, enemy_bar, HEALTH_BAR_BG_COLOR);
        let enemy_color = if battle.enemy_flash {
            ENEMY_FLASH_COLOR
        } else {
            ENEMY_HEALTH_COLOR
        };
        draw_bar_fill(
            frame,
            viewport,
            enemy_bar,
            battle.enemy_health_fraction,
            enemy_color,
        );
    }

    if let Some(inventory) = &ui.inventory {
        let panel = inventory_panel_rect(viewport);
        draw_panel(frame, viewport, panel);
        draw_slot_grid(frame, viewport, panel, inventory.slots_used, inventory.slot_count);
    }

    if let Some(party) = &ui.party {
        let panel = party_panel_rect(viewport);
        draw_panel(frame, viewport, panel);
        for (row, fraction) in party.member_health_fractions.iter().enumerate() {
            let bar = bar_in_panel(panel, row);
            fill_rect(frame, viewport, bar, HEALTH_BAR_BG_COLOR);
            draw_bar_fill(frame, viewport, bar, *fraction, PLAYER_HEALTH_COLOR);
        }
    }

    if let Some(story) = &ui.story {
        let panel = story_panel_rect(viewport);
        draw_panel(frame, viewport, panel);
        // One tick mark per page, the open page brightened.
        let count = story.page_count.max(1);
        for page in 0..count {
            let mut rect = bar_in_panel(panel, page);
            rect.width = rect.width / 3;
            let color = if page == story.page_index {
                STORY_PAGE_COLOR
            } else {
                SLOT_EMPTY_COLOR
            };
            fill_rect(frame, viewport, rect, color);
        }
    }

    if ui.menu_open {
        let panel = menu_panel_rect(viewport);
        draw_panel(frame, viewport, panel);
    }
}

fn draw_panel(frame: &mut [u8], viewport: Viewport, rect: PanelRect) {
    fill_rect(
        frame,
        viewport,
        PanelRect {
            x: rect.x - 2,
            y: rect.y - 2,
            width: rect.width + 4,
            height: rect.height + 4,
        },
        PANEL_BORDER_COLOR,
    );
    fill_rect(frame, viewport, rect, PANEL_BG_COLOR);
}

fn draw_bar_fill(
    frame: &mut [u8],
    viewport: Viewport,
    bar: PanelRect,
    fraction: f32,
    color: [u8; 4],
) {
    let clamped = fraction.clamp(0.0, 1.0);
    let filled = (bar.width as f32 * clamped).round() as i32;
    if filled < 1 {
        return;
    }
    fill_rect(
        frame,
        viewport,
        PanelRect {
            x: bar.x,
            y: bar.y,
            width: filled,
            height: bar.height,
        },
        color,
    );
}

fn draw_slot_grid(
    frame: &mut [u8],
    viewport: Viewport,
    panel: PanelRect,
    slots_used: usize,
    slot_count: usize,
) {
    const COLUMNS: usize = 5;
    const PADDING: i32 = 6;
    if slot_count == 0 {
        return;
    }
    let rows = slot_count.div_ceil(COLUMNS);
    let slot_width = (panel.width - PADDING * (COLUMNS as i32 + 1)) / COLUMNS as i32;
    let slot_height = (panel.height - PADDING * (rows as i32 + 1)) / rows as i32;
    if slot_width < 1 || slot_height < 1 {
        return;
    }

    for slot in 0..slot_count {
        let column = (slot % COLUMNS) as i32;
        let row = (slot / COLUMNS) as i32;
        let color = if slot < slots_used {
            SLOT_FILLED_COLOR
        } else {
            SLOT_EMPTY_COLOR
        };
        fill_rect(
            frame,
            viewport,
            PanelRect {
                x: panel.x + PADDING + column * (slot_width + PADDING),
                y: panel.y + PADDING + row * (slot_height + PADDING),
                width: slot_width,
                height: slot_height,
            },
            color,
        );
    }
}

fn battle_panel_rect(viewport: Viewport) -> PanelRect {
    let width = (viewport.width as i32 * 3) / 5;
    let height = 84;
    PanelRect {
        x: (viewport.width as i32 - width) / 2,
        y: viewport.height as i32 - height - 16,
        width,
        height,
    }
}

fn inventory_panel_rect(viewport: Viewport) -> PanelRect {
    let width = viewport.width as i32 / 3;
    let height = viewport.height as i32 / 2;
    PanelRect {
        x: 16,
        y: 16,
        width,
        height,
    }
}

fn party_panel_rect(viewport: Viewport) -> PanelRect {
    let width = viewport.width as i32 / 4;
    let height = viewport.height as i32 / 3;
    PanelRect {
        x: viewport.width as i32 - width - 16,
        y: 16,
        width,
        height,
    }
}

fn story_panel_rect(viewport: Viewport) -> PanelRect {
    let width = (viewport.width as i32 * 2) / 3;
    let height = (viewport.height as i32 * 2) / 3;
    PanelRect {
        x: (viewport.width as i32 - width) / 2,
        y: (viewport.height as i32 - height) / 2,
        width,
        height,
    }
}

fn menu_panel_rect(viewport: Viewport) -> PanelRect {
    let width = viewport.width as i32 / 3;
    let height = viewport.height as i32 / 2;
    PanelRect {
        x: (viewport.width as i32 - width) / 2,
        y: (viewport.height as i32 - height) / 2,
        width,
        height,
    }
}

fn loading_bar_rect(viewport: Viewport) -> PanelRect {
    let width = viewport.width as i32 / 2;
    PanelRect {
        x: (viewport.width as i32 - width) / 2,
        y: (viewport.height as i32 * 3) / 4,
        width,
        height: 14,
    }
}

fn bar_in_panel(panel: PanelRect, row: usize) -> PanelRect {
    const PADDING: i32 = 10;
    const BAR_HEIGHT: i32 = 18;
    PanelRect {
        x: panel.x + PADDING,
        y: panel.y + PADDING + row as i32 * (BAR_HEIGHT + PADDING),
        width: panel.width - PADDING * 2,
        height: BAR_HEIGHT,
    }
}

fn fill_rect(frame: &mut [u8], viewport: Viewport, rect: PanelRect, color: [u8; 4]) {
    let width = viewport.width as i32;
    let height = viewport.height as i32;
    let left = rect.x.max(0);
    let right = (rect.x + rect.width).min(width);
    let top = rect.y.max(0);
    let bottom = (rect.y + rect.height).min(height);
    if left >= right || top >= bottom {
        return;
    }

    for row in top..bottom {
        let row_start = (row * width + left) as usize * 4;
        let row_end = (row * width + right) as usize * 4;
        for pixel in frame[row_start..row_end].chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }
}

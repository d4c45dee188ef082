mod renderer;
mod transform;

pub use renderer::{
    BattlePanel, InventoryPanel, PanelRect, PartyPanel, Renderer, StoryPanel, UiSnapshot,
};
pub use transform::{project_point, ProjectedPoint, Viewport};

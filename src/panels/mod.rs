pub mod canvas_panel;
pub mod side_panel;

pub use canvas_panel::canvas_panel;
pub use side_panel::side_panel;

/// Active tab in the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SidebarTab {
    #[default]
    Text,
    Graphics,
    Background,
    Layers,
}

pub mod help_overlay;
pub mod map_view;
pub mod node_popup;
pub mod search_panel;
pub mod zoom_controls;

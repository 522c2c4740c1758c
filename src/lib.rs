//! Layered left-to-right layout and SVG rendering of BPMN-style process graphs.
//!
//! ```no_run
//! use bpmn_graph::{GraphPayload, LayoutConfig, Theme, Toggles, compute_layout, render_svg};
//!
//! let payload = GraphPayload::from_json(r#"{"activities": [{"id": 1, "name": "Draft"}]}"#)?;
//! let layout = compute_layout(&payload, Toggles::none(), &LayoutConfig::default());
//! let svg = render_svg(&layout, &Theme::default());
//! # Ok::<(), serde_json::Error>(())
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod client;
pub mod config;
pub mod layout;
pub mod layout_dump;
pub mod model;
pub mod render;
pub mod session;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use client::{ApiClient, ApiError, ApiSettings, SettingsStore};
pub use config::{Config, LayoutConfig, RenderConfig, load_config};
pub use layout::{Layout, compute_layout};
pub use model::{GraphPayload, Toggles};
pub use render::render_svg;
pub use session::{GraphView, ViewState};
pub use theme::Theme;

/// Lays out `payload` and renders it with `theme` in one call.
pub fn render_graph_svg(
    payload: &GraphPayload,
    toggles: Toggles,
    config: &LayoutConfig,
    theme: &Theme,
) -> String {
    let layout = compute_layout(payload, toggles, config);
    render_svg(&layout, theme)
}

use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Geometry used by the layered layout. Defaults reproduce the console's
/// text-sm box metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Average glyph advance in px for the fixed-width approximation.
    pub char_width: f32,
    pub line_height: f32,
    pub padding_x: f32,
    pub padding_y: f32,
    pub min_node_width: f32,
    pub max_node_width: f32,
    pub min_node_height: f32,
    pub column_gap: f32,
    pub row_gap: f32,
    /// Added to `row_gap` while condition or command bubbles are shown.
    pub edge_annotation_row_gap: f32,
    pub margin: f32,
    pub bubble_max_width: f32,
    pub bubble_padding: f32,
    /// Extra height of a bubble block on top of its text lines.
    pub bubble_block_extra: f32,
    /// Extra height of the start/end marker block on top of one line.
    pub marker_block_extra: f32,
    pub edge_bubble_min_width: f32,
    pub edge_bubble_inset: f32,
    pub edge_bubble_min_chars: usize,
    pub edge_label_lift: f32,
    pub edge_bubble_drop: f32,
    /// Relaxation budget per activity when assigning levels.
    pub level_iterations_per_activity: usize,
    /// Measure labels with system fonts instead of `char_width`.
    pub glyph_metrics: bool,
    pub glyph_font_size: f32,
    pub glyph_font_family: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            char_width: 7.2,
            line_height: 16.0,
            padding_x: 16.0,
            padding_y: 10.0,
            min_node_width: 160.0,
            max_node_width: 320.0,
            min_node_height: 48.0,
            column_gap: 100.0,
            row_gap: 90.0,
            edge_annotation_row_gap: 16.0,
            margin: 40.0,
            bubble_max_width: 300.0,
            bubble_padding: 8.0,
            bubble_block_extra: 6.0,
            marker_block_extra: 6.0,
            edge_bubble_min_width: 120.0,
            edge_bubble_inset: 60.0,
            edge_bubble_min_chars: 10,
            edge_label_lift: 6.0,
            edge_bubble_drop: 10.0,
            level_iterations_per_activity: 5,
            glyph_metrics: false,
            glyph_font_size: 14.0,
            glyph_font_family: "Inter, Segoe UI, system-ui, sans-serif".to_string(),
        }
    }
}

impl LayoutConfig {
    /// Characters per node label line.
    pub fn max_label_chars(&self) -> usize {
        chars_fitting(self.max_node_width - self.padding_x * 2.0, self.char_width)
    }

    /// Characters per annotation bubble line under a node.
    pub fn max_bubble_chars(&self) -> usize {
        chars_fitting(self.bubble_max_width - self.bubble_padding, self.char_width)
    }
}

pub(crate) fn chars_fitting(width: f32, char_width: f32) -> usize {
    if char_width <= 0.0 {
        return 1;
    }
    ((width / char_width).floor() as usize).max(1)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: json5::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfig>,
    render: Option<RenderConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    background: Option<String>,
    primary_color: Option<String>,
    primary_text_color: Option<String>,
    primary_border_color: Option<String>,
    line_color: Option<String>,
    start_color: Option<String>,
    end_color: Option<String>,
}

/// Loads a JSON or JSON5 config file and merges it onto the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let parsed: ConfigFile = json5::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "dark" {
            config.theme = Theme::dark();
        } else if theme_name == "default" || theme_name == "console" {
            config.theme = Theme::console();
        } else {
            tracing::warn!(theme = theme_name, "unknown theme name, keeping default");
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.primary_color {
            config.theme.node_fill = v;
        }
        if let Some(v) = vars.primary_text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.primary_border_color {
            config.theme.node_border = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.start_color {
            config.theme.start_fill = v;
        }
        if let Some(v) = vars.end_color {
            config.theme.end_fill = v;
        }
    }

    if let Some(layout) = parsed.layout {
        config.layout = layout;
    }
    if let Some(render) = parsed.render {
        config.render = render;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_char_budgets() {
        let config = LayoutConfig::default();
        assert_eq!(config.max_label_chars(), 40);
        assert_eq!(config.max_bubble_chars(), 40);
    }

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout, LayoutConfig::default());
        assert_eq!(config.theme.font_size, 14.0);
    }

    #[test]
    fn json5_file_merges_onto_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r##"{{
                // comments are allowed
                theme: "dark",
                themeVariables: {{ lineColor: "#ff0000" }},
                layout: {{ rowGap: 120, margin: 20 }},
            }}"##
        )
        .unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.theme.line_color, "#ff0000");
        assert_eq!(config.theme.background, Theme::dark().background);
        assert_eq!(config.layout.row_gap, 120.0);
        assert_eq!(config.layout.margin, 20.0);
        assert_eq!(config.layout.column_gap, 100.0);
    }

    #[test]
    fn unreadable_file_reports_path() {
        let err = load_config(Some(Path::new("/definitely/not/here.json"))).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}

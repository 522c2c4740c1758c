use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub annotation_font_size: f32,
    pub edge_label_font_size: f32,
    pub background: String,
    pub frame_border: String,
    pub node_fill: String,
    pub node_border: String,
    pub start_fill: String,
    pub start_border: String,
    pub end_fill: String,
    pub end_border: String,
    pub text_color: String,
    pub muted_text_color: String,
    pub line_color: String,
    pub arrow_color: String,
    pub bubble_fill: String,
    pub bubble_opacity: f32,
    pub inbound_color: String,
    pub outbound_color: String,
    pub condition_color: String,
    pub command_color: String,
}

impl Theme {
    /// Light palette used by the admin console.
    pub fn console() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 14.0,
            annotation_font_size: 10.0,
            edge_label_font_size: 11.0,
            background: "#F9FAFB".to_string(),
            frame_border: "#E5E7EB".to_string(),
            node_fill: "#FFFFFF".to_string(),
            node_border: "#D1D5DB".to_string(),
            start_fill: "#ECFDF5".to_string(),
            start_border: "#6EE7B7".to_string(),
            end_fill: "#FFF1F2".to_string(),
            end_border: "#FDA4AF".to_string(),
            text_color: "#1F2937".to_string(),
            muted_text_color: "#6B7280".to_string(),
            line_color: "#94A3B8".to_string(),
            arrow_color: "#64748B".to_string(),
            bubble_fill: "#FFFFFF".to_string(),
            bubble_opacity: 0.9,
            inbound_color: "#047857".to_string(),
            outbound_color: "#0369A1".to_string(),
            condition_color: "#B45309".to_string(),
            command_color: "#4338CA".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: "#111827".to_string(),
            frame_border: "#374151".to_string(),
            node_fill: "#1F2937".to_string(),
            node_border: "#4B5563".to_string(),
            start_fill: "#064E3B".to_string(),
            start_border: "#10B981".to_string(),
            end_fill: "#4C0519".to_string(),
            end_border: "#F43F5E".to_string(),
            text_color: "#F3F4F6".to_string(),
            muted_text_color: "#9CA3AF".to_string(),
            line_color: "#64748B".to_string(),
            arrow_color: "#94A3B8".to_string(),
            bubble_fill: "#111827".to_string(),
            inbound_color: "#34D399".to_string(),
            outbound_color: "#38BDF8".to_string(),
            condition_color: "#FBBF24".to_string(),
            command_color: "#A5B4FC".to_string(),
            ..Self::console()
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::console()
    }
}

#[cfg(feature = "png")]
use crate::config::RenderConfig;
use crate::layout::{Bubble, BubbleKind, Layout, NodeKind, NodeLayout, fmt_num};
use crate::theme::Theme;
use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

const NODE_RADIUS: f32 = 8.0;
const BUBBLE_RADIUS: f32 = 3.0;

pub fn render_svg(layout: &Layout, theme: &Theme) -> String {
    let mut svg = String::new();
    let width = fmt_num(layout.width);
    let height = fmt_num(layout.height);

    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
    );
    let _ = write!(
        svg,
        "<rect width=\"100%\" height=\"100%\" rx=\"6\" fill=\"{}\" stroke=\"{}\"/>",
        escape_xml(&theme.background),
        escape_xml(&theme.frame_border)
    );
    let _ = write!(
        svg,
        "<defs><marker id=\"arrow\" markerWidth=\"10\" markerHeight=\"10\" refX=\"10\" refY=\"3\" orient=\"auto\" markerUnits=\"strokeWidth\"><path d=\"M0,0 L0,6 L9,3 z\" fill=\"{}\"/></marker></defs>",
        escape_xml(&theme.arrow_color)
    );

    // Edges go first so node boxes and bubbles sit on top of them.
    for edge in &layout.edges {
        svg.push_str("<g class=\"edge\">");
        let stroke = edge.stroke.as_deref().unwrap_or(&theme.line_color);
        let _ = write!(
            svg,
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\" marker-end=\"url(#arrow)\"/>",
            edge.path.to_svg_d(),
            escape_xml(stroke)
        );
        if !edge.title.is_empty() {
            let _ = write!(svg, "<title>{}</title>", escape_xml(&edge.title));
        }
        if let (Some(name), Some(anchor)) = (&edge.name, edge.label_anchor) {
            let _ = write!(
                svg,
                "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
                fmt_num(anchor.x),
                fmt_num(anchor.y),
                escape_xml(&theme.font_family),
                fmt_num(theme.edge_label_font_size),
                escape_xml(&theme.muted_text_color),
                escape_xml(name)
            );
        }
        for bubble in &edge.bubbles {
            push_bubble(&mut svg, bubble, 0.0, 0.0, theme);
        }
        svg.push_str("</g>");
    }

    for node in &layout.nodes {
        push_node(&mut svg, node, layout.line_height, theme);
    }

    svg.push_str("</svg>");
    svg
}

fn push_node(svg: &mut String, node: &NodeLayout, line_height: f32, theme: &Theme) {
    let (fill, stroke) = match node.kind {
        NodeKind::Start => (&theme.start_fill, &theme.start_border),
        NodeKind::End => (&theme.end_fill, &theme.end_border),
        NodeKind::Task => (&theme.node_fill, &theme.node_border),
    };
    let _ = write!(
        svg,
        "<g class=\"node\" transform=\"translate({}, {})\">",
        fmt_num(node.x),
        fmt_num(node.y)
    );
    let _ = write!(
        svg,
        "<rect width=\"{}\" height=\"{}\" rx=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.5\"/>",
        fmt_num(node.w),
        fmt_num(node.h),
        fmt_num(NODE_RADIUS),
        escape_xml(fill),
        escape_xml(stroke)
    );
    let _ = write!(svg, "<title>{}</title>", escape_xml(&node.title));

    let total = node.lines.len() as f32 * line_height;
    let start_y = ((node.h - total) / 2.0).round().max(0.0) + 12.0;
    let _ = write!(
        svg,
        "<text text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">",
        escape_xml(&theme.font_family),
        fmt_num(theme.font_size),
        escape_xml(&theme.text_color)
    );
    for (idx, line) in node.lines.iter().enumerate() {
        let _ = write!(
            svg,
            "<tspan x=\"{}\" y=\"{}\">{}</tspan>",
            fmt_num(node.w / 2.0),
            fmt_num(start_y + idx as f32 * line_height),
            escape_xml(line)
        );
    }
    svg.push_str("</text>");

    // Overlays are positioned absolutely; undo the group translation.
    for bubble in &node.bubbles {
        push_bubble(svg, bubble, node.x, node.y, theme);
    }
    if let Some(marker) = &node.marker {
        let _ = write!(
            svg,
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            fmt_num(marker.x - node.x),
            fmt_num(marker.y - node.y),
            escape_xml(&theme.font_family),
            fmt_num(theme.annotation_font_size),
            escape_xml(&theme.muted_text_color),
            escape_xml(&marker.text)
        );
    }
    svg.push_str("</g>");
}

fn push_bubble(svg: &mut String, bubble: &Bubble, offset_x: f32, offset_y: f32, theme: &Theme) {
    let color = match bubble.kind {
        BubbleKind::Inbound => &theme.inbound_color,
        BubbleKind::Outbound => &theme.outbound_color,
        BubbleKind::Conditions => &theme.condition_color,
        BubbleKind::Commands => &theme.command_color,
    };
    let _ = write!(
        svg,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" fill=\"{}\" opacity=\"{}\"/>",
        fmt_num(bubble.x - offset_x),
        fmt_num(bubble.y - offset_y),
        fmt_num(bubble.width),
        fmt_num(bubble.height),
        fmt_num(BUBBLE_RADIUS),
        escape_xml(&theme.bubble_fill),
        fmt_num(theme.bubble_opacity)
    );
    let _ = write!(
        svg,
        "<text text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">",
        escape_xml(&theme.font_family),
        fmt_num(theme.annotation_font_size),
        escape_xml(color)
    );
    for (idx, line) in bubble.lines.iter().enumerate() {
        let _ = write!(
            svg,
            "<tspan x=\"{}\" y=\"{}\">{}</tspan>",
            fmt_num(bubble.text_x - offset_x),
            fmt_num(bubble.text_y - offset_y + idx as f32 * bubble.line_height),
            escape_xml(line)
        );
    }
    svg.push_str("</text>");
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
            tracing::info!(path = %path.display(), bytes = svg.len(), "wrote svg");
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme
        .font_family
        .split(',')
        .next()
        .map(|f| f.trim().trim_matches('"').to_string())
        .unwrap_or_else(|| "sans-serif".to_string());
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .ok_or_else(|| anyhow::anyhow!("Invalid default render size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    tracing::info!(path = %output.display(), width = size.width(), height = size.height(), "wrote png");
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

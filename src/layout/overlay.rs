use crate::config::{LayoutConfig, chars_fitting};

use super::text::TextMeasure;
use super::{Bubble, BubbleKind, CubicPath, Marker, NodeKind};

// Offsets of the 10px annotation text inside its band.
const BUBBLE_TOP_OFFSET: f32 = 1.0;
const BUBBLE_BASELINE: f32 = 11.0;
const MARKER_BASELINE: f32 = 15.0;
const EDGE_BUBBLE_GAP: f32 = 4.0;

/// Wrapped and sized bubble content, not yet positioned.
#[derive(Debug, Clone)]
pub(super) struct BubbleText {
    pub kind: BubbleKind,
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

impl BubbleKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Inbound => "In",
            Self::Outbound => "Out",
            Self::Conditions => "Conds",
            Self::Commands => "Cmds",
        }
    }
}

pub(super) fn annotation_label(kind: BubbleKind, names: &[String]) -> String {
    format!("{}: {}", kind.prefix(), names.join(", "))
}

fn bubble_text(
    kind: BubbleKind,
    names: &[String],
    max_chars: usize,
    config: &LayoutConfig,
    measure: &TextMeasure,
) -> Option<BubbleText> {
    if names.is_empty() {
        return None;
    }
    let lines = measure.wrap(&annotation_label(kind, names), max_chars);
    let width = lines
        .iter()
        .map(|line| measure.width(line).round() + config.bubble_padding)
        .fold(0.0, f32::max);
    let height = lines.len() as f32 * config.line_height + config.bubble_block_extra;
    Some(BubbleText {
        kind,
        lines,
        width,
        height,
    })
}

/// Inbound then outbound bubble content for one activity, honouring the toggles.
pub(super) fn node_bubble_texts(
    inbound: &[String],
    outbound: &[String],
    show_inbound: bool,
    show_outbound: bool,
    config: &LayoutConfig,
    measure: &TextMeasure,
) -> Vec<BubbleText> {
    let max_chars = config.max_bubble_chars();
    let mut texts = Vec::new();
    if show_inbound {
        texts.extend(bubble_text(BubbleKind::Inbound, inbound, max_chars, config, measure));
    }
    if show_outbound {
        texts.extend(bubble_text(BubbleKind::Outbound, outbound, max_chars, config, measure));
    }
    texts
}

/// Vertical space kept free under a node for its bubbles and marker.
pub(super) fn reserve_height(texts: &[BubbleText], kind: NodeKind, config: &LayoutConfig) -> f32 {
    let bubbles: f32 = texts.iter().map(|t| t.height).sum();
    let marker = match kind {
        NodeKind::Task => 0.0,
        NodeKind::Start | NodeKind::End => config.line_height + config.marker_block_extra,
    };
    bubbles + marker
}

/// Stacks bubbles under the node box, centred on it, followed by the marker.
pub(super) fn place_node_overlays(
    x: f32,
    bottom: f32,
    w: f32,
    kind: NodeKind,
    texts: Vec<BubbleText>,
    line_height: f32,
) -> (Vec<Bubble>, Option<Marker>) {
    let center_x = x + w / 2.0;
    let mut cursor = bottom + BUBBLE_TOP_OFFSET;
    let mut bubbles = Vec::with_capacity(texts.len());
    for text in texts {
        // Keep wide bubbles in the first column on the canvas.
        let left = (center_x - text.width / 2.0).max(0.0);
        bubbles.push(Bubble {
            kind: text.kind,
            x: left,
            y: cursor,
            width: text.width,
            height: text.height,
            text_x: left + text.width / 2.0,
            text_y: cursor + BUBBLE_BASELINE,
            line_height,
            lines: text.lines,
        });
        cursor += text.height;
    }
    let marker = match kind {
        NodeKind::Task => None,
        NodeKind::Start => Some("Start"),
        NodeKind::End => Some("End"),
    }
    .map(|text| Marker {
        text: text.to_string(),
        x: center_x,
        y: cursor + MARKER_BASELINE,
    });
    (bubbles, marker)
}

/// Condition and command bubbles stacked below the edge midpoint. The wrap
/// width follows the horizontal room between the two boxes.
pub(super) fn edge_bubbles(
    path: &CubicPath,
    conditions: &[String],
    commands: &[String],
    show_conditions: bool,
    show_commands: bool,
    config: &LayoutConfig,
    measure: &TextMeasure,
) -> Vec<Bubble> {
    let available = ((path.end.x - path.start.x).abs() - config.edge_bubble_inset)
        .max(config.edge_bubble_min_width);
    let wrap_chars = chars_fitting(
        available.min(config.bubble_max_width) - config.bubble_padding,
        config.char_width,
    )
    .max(config.edge_bubble_min_chars);

    let mut texts = Vec::new();
    if show_conditions {
        texts.extend(bubble_text(BubbleKind::Conditions, conditions, wrap_chars, config, measure));
    }
    if show_commands {
        texts.extend(bubble_text(BubbleKind::Commands, commands, wrap_chars, config, measure));
    }

    let mid = path.midpoint();
    let mut cursor = mid.y + config.edge_bubble_drop - BUBBLE_BASELINE;
    texts
        .into_iter()
        .map(|text| {
            let width = text.width.min(available);
            let bubble = Bubble {
                kind: text.kind,
                x: mid.x - width / 2.0,
                y: cursor,
                width,
                height: text.height,
                text_x: mid.x,
                text_y: cursor + BUBBLE_BASELINE,
                line_height: config.line_height,
                lines: text.lines,
            };
            cursor += text.height + EDGE_BUBBLE_GAP;
            bubble
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Point;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn measure() -> TextMeasure {
        TextMeasure::Chars { char_width: 7.2 }
    }

    #[test]
    fn label_joins_names_with_prefix() {
        assert_eq!(
            annotation_label(BubbleKind::Inbound, &names(&["a", "b", "c"])),
            "In: a, b, c"
        );
        assert_eq!(annotation_label(BubbleKind::Commands, &names(&["x"])), "Cmds: x");
    }

    #[test]
    fn hidden_or_empty_annotations_make_no_bubbles() {
        let config = LayoutConfig::default();
        let texts = node_bubble_texts(&names(&["a"]), &[], false, true, &config, &measure());
        assert!(texts.is_empty());
    }

    #[test]
    fn bubble_is_sized_to_its_text() {
        let config = LayoutConfig::default();
        let texts = node_bubble_texts(&names(&["Notify"]), &[], true, false, &config, &measure());
        assert_eq!(texts.len(), 1);
        // "In: Notify" is 10 chars: round(72) + 8
        assert_eq!(texts[0].width, 80.0);
        assert_eq!(texts[0].height, 22.0);
        assert_eq!(texts[0].lines, vec!["In: Notify"]);
    }

    #[test]
    fn long_annotation_lists_wrap() {
        let config = LayoutConfig::default();
        let many = names(&["Send notification", "Archive document", "Update ledger", "Audit"]);
        let texts = node_bubble_texts(&[], &many, false, true, &config, &measure());
        assert!(texts[0].lines.len() >= 2);
        assert!(texts[0].lines.iter().all(|l| l.chars().count() <= 40));
        assert_eq!(texts[0].height, texts[0].lines.len() as f32 * 16.0 + 6.0);
    }

    #[test]
    fn reserve_counts_bubbles_and_marker() {
        let config = LayoutConfig::default();
        let texts = node_bubble_texts(&names(&["a"]), &names(&["b"]), true, true, &config, &measure());
        assert_eq!(reserve_height(&texts, NodeKind::Task, &config), 44.0);
        assert_eq!(reserve_height(&texts, NodeKind::End, &config), 66.0);
        assert_eq!(reserve_height(&[], NodeKind::Start, &config), 22.0);
    }

    #[test]
    fn node_overlays_stack_downwards() {
        let config = LayoutConfig::default();
        let texts = node_bubble_texts(&names(&["a"]), &names(&["b"]), true, true, &config, &measure());
        let (bubbles, marker) = place_node_overlays(40.0, 88.0, 160.0, NodeKind::Start, texts, 16.0);
        assert_eq!(bubbles.len(), 2);
        assert_eq!(bubbles[0].kind, BubbleKind::Inbound);
        assert_eq!(bubbles[0].y, 89.0);
        assert_eq!(bubbles[1].y, bubbles[0].y + bubbles[0].height);
        assert_eq!(bubbles[0].text_x, 120.0);
        let marker = marker.unwrap();
        assert_eq!(marker.text, "Start");
        assert!(marker.y > bubbles[1].y + bubbles[1].height);
    }

    #[test]
    fn wide_bubble_is_clamped_to_canvas() {
        let config = LayoutConfig::default();
        let inbound = names(&["Send notification to the reviewer team now"]);
        let texts = node_bubble_texts(&inbound, &[], true, false, &config, &measure());
        let width = texts[0].width;
        assert!(width > 240.0);
        let (bubbles, _) = place_node_overlays(40.0, 88.0, 160.0, NodeKind::Start, texts, 16.0);
        assert_eq!(bubbles[0].x, 0.0);
        assert_eq!(bubbles[0].text_x, width / 2.0);
    }

    #[test]
    fn edge_bubbles_follow_midpoint() {
        let config = LayoutConfig::default();
        let path = CubicPath::horizontal(Point::new(200.0, 64.0), Point::new(300.0, 64.0));
        let bubbles = edge_bubbles(
            &path,
            &names(&["amount > 100"]),
            &names(&["Email manager"]),
            true,
            true,
            &config,
            &measure(),
        );
        assert_eq!(bubbles.len(), 2);
        assert_eq!(bubbles[0].kind, BubbleKind::Conditions);
        assert_eq!(bubbles[0].text_x, 250.0);
        assert_eq!(bubbles[0].y, 63.0);
        assert!(bubbles[1].y >= bubbles[0].y + bubbles[0].height);
        // narrow gap: width capped at the 120px minimum room
        assert!(bubbles.iter().all(|b| b.width <= 120.0));
    }

    #[test]
    fn edge_bubbles_respect_toggles() {
        let config = LayoutConfig::default();
        let path = CubicPath::horizontal(Point::new(0.0, 0.0), Point::new(400.0, 0.0));
        let bubbles = edge_bubbles(
            &path,
            &names(&["c"]),
            &names(&["d"]),
            false,
            true,
            &config,
            &measure(),
        );
        assert_eq!(bubbles.len(), 1);
        assert_eq!(bubbles[0].kind, BubbleKind::Commands);
    }
}

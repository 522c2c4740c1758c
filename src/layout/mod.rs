//! Layered left-to-right layout of a process graph.
//!
//! Activities are assigned a level by longest-path relaxation, grouped into
//! one column per level, and stacked top to bottom inside their column.
//! Annotation bubbles reserve space under their node so rows never overlap.
//! The result is a pure function of the payload, the toggles and the
//! config; nothing is cached between runs.

mod overlay;
mod ranking;
mod text;
pub(crate) mod types;

pub use ranking::{Levels, assign_levels, group_columns};
pub use text::wrap_words;
pub use types::*;

use std::collections::HashMap;

use crate::config::LayoutConfig;
use crate::model::{Activity, GraphPayload, Toggles};
use overlay::{BubbleText, annotation_label, edge_bubbles, node_bubble_texts, place_node_overlays, reserve_height};
use text::TextMeasure;

/// Display names of annotations, grouped by the activity or node they belong to.
#[derive(Debug, Default)]
struct Annotations {
    inbound: HashMap<i64, Vec<String>>,
    outbound: HashMap<i64, Vec<String>>,
    conditions: HashMap<i64, Vec<String>>,
    commands: HashMap<i64, Vec<String>>,
    edge_colors: HashMap<i64, String>,
}

impl Annotations {
    fn collect(payload: &GraphPayload) -> Self {
        let mut annotations = Self::default();
        for item in &payload.inbound {
            annotations
                .inbound
                .entry(item.activity_id)
                .or_default()
                .push(item.display_name());
        }
        for item in &payload.outbound {
            annotations
                .outbound
                .entry(item.activity_id)
                .or_default()
                .push(item.display_name());
        }
        for item in &payload.node_conditions {
            annotations
                .conditions
                .entry(item.node_id)
                .or_default()
                .push(item.display_name());
        }
        for item in &payload.node_commands {
            annotations
                .commands
                .entry(item.node_id)
                .or_default()
                .push(item.display_name());
            // Only typed commands colour their edge.
            let typed = item
                .node_command_type_name
                .as_deref()
                .is_some_and(|name| !name.is_empty());
            if let Some(color) = item
                .node_command_type_color
                .as_deref()
                .filter(|c| typed && !c.is_empty())
            {
                annotations
                    .edge_colors
                    .entry(item.node_id)
                    .or_insert_with(|| color.to_string());
            }
        }
        annotations
    }

    fn names(map: &HashMap<i64, Vec<String>>, id: i64) -> &[String] {
        map.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }
}

struct LabelBox {
    lines: Vec<String>,
    w: f32,
    h: f32,
}

fn label_box(activity: &Activity, config: &LayoutConfig, measure: &TextMeasure) -> LabelBox {
    let lines = measure.wrap(&activity.display_name(), config.max_label_chars());
    let widest = measure.widest(&lines).max(config.char_width);
    let w = (config.padding_x * 2.0 + widest)
        .round()
        .max(config.min_node_width)
        .min(config.max_node_width);
    let h = (config.padding_y * 2.0 + lines.len() as f32 * config.line_height)
        .round()
        .max(config.min_node_height);
    LabelBox { lines, w, h }
}

fn node_kind(activity: &Activity) -> NodeKind {
    if activity.is_start_activity {
        NodeKind::Start
    } else if activity.is_end_activity {
        NodeKind::End
    } else {
        NodeKind::Task
    }
}

struct Placement {
    x: f32,
    y: f32,
    overlays: Vec<BubbleText>,
}

pub fn compute_layout(payload: &GraphPayload, toggles: Toggles, config: &LayoutConfig) -> Layout {
    let measure = TextMeasure::from_config(config);
    let annotations = Annotations::collect(payload);
    let levels = assign_levels(
        &payload.activities,
        &payload.edges,
        config.level_iterations_per_activity,
    );
    let columns = group_columns(&payload.activities, &levels);

    let boxes: HashMap<i64, LabelBox> = payload
        .activities
        .iter()
        .map(|a| (a.id, label_box(a, config, &measure)))
        .collect();

    let row_gap = if toggles.shows_edge_annotations() {
        config.row_gap + config.edge_annotation_row_gap
    } else {
        config.row_gap
    };

    let mut placements: HashMap<i64, Placement> = HashMap::new();
    let mut x_base = config.margin;
    let mut column_bottoms = Vec::with_capacity(columns.len());
    for column in columns.values() {
        let column_width = column
            .iter()
            .map(|a| boxes[&a.id].w)
            .fold(config.min_node_width, f32::max);
        let mut y_cursor = config.margin;
        for activity in column {
            let overlays = node_bubble_texts(
                Annotations::names(&annotations.inbound, activity.id),
                Annotations::names(&annotations.outbound, activity.id),
                toggles.inbound,
                toggles.outbound,
                config,
                &measure,
            );
            let reserve = reserve_height(&overlays, node_kind(activity), config);
            placements.insert(
                activity.id,
                Placement {
                    x: x_base,
                    y: y_cursor,
                    overlays,
                },
            );
            y_cursor += boxes[&activity.id].h + reserve + row_gap;
        }
        column_bottoms.push(y_cursor - row_gap + config.margin);
        x_base += column_width + config.column_gap;
    }

    let width = x_base + config.margin;
    let height = column_bottoms
        .into_iter()
        .reduce(f32::max)
        .unwrap_or(config.margin * 2.0);

    let nodes: Vec<NodeLayout> = payload
        .activities
        .iter()
        .map(|activity| {
            let label = &boxes[&activity.id];
            let kind = node_kind(activity);
            let (x, y, overlays) = match placements.get(&activity.id) {
                Some(p) => (p.x, p.y, p.overlays.clone()),
                None => (config.margin, config.margin, Vec::new()),
            };
            let (bubbles, marker) =
                place_node_overlays(x, y + label.h, label.w, kind, overlays, config.line_height);
            NodeLayout {
                id: activity.id,
                name: activity.name.clone(),
                is_start_activity: activity.is_start_activity,
                is_end_activity: activity.is_end_activity,
                kind,
                level: levels.level(activity.id),
                x,
                y,
                w: label.w,
                h: label.h,
                lines: label.lines.clone(),
                bubbles,
                marker,
                title: node_title(activity, &annotations, toggles),
            }
        })
        .collect();

    let node_index: HashMap<i64, usize> = nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| (node.id, idx))
        .collect();
    let origin = Point::new(config.margin, config.margin);

    let edges = payload
        .edges
        .iter()
        .map(|edge| {
            let from = node_index
                .get(&edge.from_activity_id)
                .map(|&idx| nodes[idx].right_center())
                .unwrap_or(origin);
            let to = node_index
                .get(&edge.to_activity_id)
                .map(|&idx| nodes[idx].left_center())
                .unwrap_or(origin);
            let path = CubicPath::horizontal(from, to);
            let name = edge.name.clone().filter(|n| !n.is_empty());
            let label_anchor = name.as_ref().map(|_| {
                let mid = path.midpoint();
                Point::new(mid.x, mid.y - config.edge_label_lift)
            });
            let bubbles = edge_bubbles(
                &path,
                Annotations::names(&annotations.conditions, edge.id),
                Annotations::names(&annotations.commands, edge.id),
                toggles.node_conditions,
                toggles.node_commands,
                config,
                &measure,
            );
            let stroke = if toggles.node_commands {
                annotations.edge_colors.get(&edge.id).cloned()
            } else {
                None
            };
            EdgeLayout {
                id: edge.id,
                from_activity_id: edge.from_activity_id,
                to_activity_id: edge.to_activity_id,
                title: edge_title(name.as_deref(), edge.id, &annotations, toggles),
                name,
                from,
                to,
                path,
                label_anchor,
                bubbles,
                stroke,
            }
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        columns = columns.len(),
        width,
        height,
        capped = levels.capped,
        "computed process graph layout"
    );

    Layout {
        nodes,
        edges,
        width,
        height,
        line_height: config.line_height,
        levels_capped: levels.capped,
    }
}

fn node_title(activity: &Activity, annotations: &Annotations, toggles: Toggles) -> String {
    let name = if activity.name.is_empty() {
        format!("#{}", activity.id)
    } else {
        activity.name.clone()
    };
    let mut parts = vec![format!("Activity: {name}")];
    if toggles.inbound {
        let names = Annotations::names(&annotations.inbound, activity.id);
        parts.push(format!("Inbound: {}", names.join(", ")));
    }
    if toggles.outbound {
        let names = Annotations::names(&annotations.outbound, activity.id);
        parts.push(format!("Outbound: {}", names.join(", ")));
    }
    parts.join(" | ")
}

fn edge_title(name: Option<&str>, edge_id: i64, annotations: &Annotations, toggles: Toggles) -> String {
    let mut parts: Vec<String> = name.map(str::to_string).into_iter().collect();
    if toggles.node_conditions {
        parts.push(annotation_label(
            BubbleKind::Conditions,
            Annotations::names(&annotations.conditions, edge_id),
        ));
    }
    if toggles.node_commands {
        parts.push(annotation_label(
            BubbleKind::Commands,
            Annotations::names(&annotations.commands, edge_id),
        ));
    }
    parts.join(" | ")
}

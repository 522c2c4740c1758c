use crate::layout::{Layout, NodeKind};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Flat, diff-friendly view of a layout for debugging and fixtures.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub levels_capped: bool,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: i64,
    pub kind: NodeKind,
    pub level: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label_lines: Vec<String>,
    pub bubble_lines: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDump {
    pub id: i64,
    pub from: i64,
    pub to: i64,
    pub points: Vec<[f32; 2]>,
    pub bubble_lines: Vec<Vec<String>>,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id,
                kind: node.kind,
                level: node.level,
                x: node.x,
                y: node.y,
                width: node.w,
                height: node.h,
                label_lines: node.lines.clone(),
                bubble_lines: node.bubbles.iter().map(|b| b.lines.clone()).collect(),
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| {
                let path = edge.path;
                EdgeDump {
                    id: edge.id,
                    from: edge.from_activity_id,
                    to: edge.to_activity_id,
                    points: [path.start, path.c1, path.c2, path.end]
                        .iter()
                        .map(|p| [p.x, p.y])
                        .collect(),
                    bubble_lines: edge.bubbles.iter().map(|b| b.lines.clone()).collect(),
                }
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            levels_capped: layout.levels_capped,
            nodes,
            edges,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    tracing::info!(path = %path.display(), "wrote layout dump");
    Ok(())
}

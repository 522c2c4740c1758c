use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Start,
    End,
    Task,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BubbleKind {
    Inbound,
    Outbound,
    Conditions,
    Commands,
}

/// A legibility box of wrapped annotation text. `x`/`y` is the top-left of
/// the background rect; lines are centred on `text_x` with the first
/// baseline at `text_y`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bubble {
    pub kind: BubbleKind,
    pub lines: Vec<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub text_x: f32,
    pub text_y: f32,
    pub line_height: f32,
}

/// "Start"/"End" caption below a node and its bubbles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeLayout {
    pub id: i64,
    pub name: String,
    pub is_start_activity: bool,
    pub is_end_activity: bool,
    pub kind: NodeKind,
    pub level: usize,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub lines: Vec<String>,
    pub bubbles: Vec<Bubble>,
    pub marker: Option<Marker>,
    pub title: String,
}

impl NodeLayout {
    pub fn right_center(&self) -> Point {
        Point::new(self.x + self.w, self.y + self.h / 2.0)
    }

    pub fn left_center(&self) -> Point {
        Point::new(self.x, self.y + self.h / 2.0)
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }
}

/// Cubic connector with both control points on the horizontal midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CubicPath {
    pub start: Point,
    pub c1: Point,
    pub c2: Point,
    pub end: Point,
}

impl CubicPath {
    pub fn horizontal(start: Point, end: Point) -> Self {
        let mid_x = (start.x + end.x) / 2.0;
        Self {
            start,
            c1: Point::new(mid_x, start.y),
            c2: Point::new(mid_x, end.y),
            end,
        }
    }

    pub fn midpoint(&self) -> Point {
        Point::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }

    pub fn to_svg_d(&self) -> String {
        format!(
            "M {} {} C {} {}, {} {}, {} {}",
            fmt_num(self.start.x),
            fmt_num(self.start.y),
            fmt_num(self.c1.x),
            fmt_num(self.c1.y),
            fmt_num(self.c2.x),
            fmt_num(self.c2.y),
            fmt_num(self.end.x),
            fmt_num(self.end.y)
        )
    }
}

pub(crate) fn fmt_num(value: f32) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeLayout {
    pub id: i64,
    pub from_activity_id: i64,
    pub to_activity_id: i64,
    pub name: Option<String>,
    /// Right-centre of the source box.
    pub from: Point,
    /// Left-centre of the target box.
    pub to: Point,
    pub path: CubicPath,
    pub label_anchor: Option<Point>,
    pub bubbles: Vec<Bubble>,
    pub stroke: Option<String>,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub nodes: Vec<NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    pub width: f32,
    pub height: f32,
    /// Baseline distance of wrapped label lines.
    pub line_height: f32,
    pub levels_capped: bool,
}

impl Layout {
    pub fn node(&self, id: i64) -> Option<&NodeLayout> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn column_count(&self) -> usize {
        let mut levels: Vec<usize> = self.nodes.iter().map(|n| n.level).collect();
        levels.sort_unstable();
        levels.dedup();
        levels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubic_path_uses_horizontal_midpoint() {
        let path = CubicPath::horizontal(Point::new(200.0, 64.0), Point::new(300.0, 100.0));
        assert_eq!(path.c1, Point::new(250.0, 64.0));
        assert_eq!(path.c2, Point::new(250.0, 100.0));
        assert_eq!(path.to_svg_d(), "M 200 64 C 250 64, 250 100, 300 100");
        assert_eq!(path.midpoint(), Point::new(250.0, 82.0));
    }

    #[test]
    fn fmt_num_trims_integers() {
        assert_eq!(fmt_num(12.0), "12");
        assert_eq!(fmt_num(12.5), "12.5");
        assert_eq!(fmt_num(-3.256), "-3.26");
    }
}

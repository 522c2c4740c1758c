use bpmn_graph::config::LayoutConfig;
use bpmn_graph::layout::{assign_levels, compute_layout};
use bpmn_graph::model::{
    ActionAnnotation, Activity, Edge, GraphPayload, NodeCommandAnnotation, NodeConditionAnnotation,
    Toggles,
};
use bpmn_graph::render::render_svg;
use bpmn_graph::theme::Theme;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// A chain of `activities` with `extra_edges` forward skips and one annotation
/// of every kind per activity/edge.
fn dense_process(activities: usize, extra_edges: usize) -> GraphPayload {
    let mut payload = GraphPayload::default();
    if activities == 0 {
        return payload;
    }
    for i in 0..activities {
        let mut activity = Activity::new(i as i64 + 1, format!("Activity step number {i}"));
        activity.is_start_activity = i == 0;
        activity.is_end_activity = i + 1 == activities;
        payload.activities.push(activity);
    }
    let mut edge_id = 1000;
    let mut push_edge = |payload: &mut GraphPayload, from: usize, to: usize| {
        edge_id += 1;
        payload.edges.push(Edge::new(edge_id, from as i64 + 1, to as i64 + 1));
    };
    for i in 0..activities.saturating_sub(1) {
        push_edge(&mut payload, i, i + 1);
    }
    let mut count = 0usize;
    'outer: for i in 0..activities {
        for j in (i + 2)..activities {
            if count >= extra_edges {
                break 'outer;
            }
            push_edge(&mut payload, i, j);
            count += 1;
        }
    }
    for (idx, activity) in payload.activities.iter().enumerate() {
        let name = format!("Action {idx}");
        payload
            .inbound
            .push(ActionAnnotation::new(activity.id, idx as i64, Some(name.as_str())));
        payload
            .outbound
            .push(ActionAnnotation::new(activity.id, idx as i64 + 1, None));
    }
    for edge in &payload.edges {
        payload.node_conditions.push(NodeConditionAnnotation {
            node_id: edge.id,
            condition_id: edge.id,
            condition_name: Some(format!("amount > {}", edge.id)),
            priority: None,
        });
        payload.node_commands.push(NodeCommandAnnotation {
            id: edge.id,
            node_id: edge.id,
            name: Some("Approve".to_string()),
            route: None,
            node_command_type_id: 1,
            node_command_type_name: None,
            node_command_type_color: Some("#2563eb".to_string()),
        });
    }
    payload
}

/// Two activities feeding each other, plus a tail; exercises the relaxation cap.
fn cyclic_process(activities: usize) -> GraphPayload {
    let mut payload = dense_process(activities, 0);
    let last = activities as i64;
    payload.edges.push(Edge::new(9999, last, 1));
    payload
}

fn bench_levels(c: &mut Criterion) {
    let mut group = c.benchmark_group("levels");
    for (name, payload) in [
        ("chain_50", dense_process(50, 0)),
        ("dense_200", dense_process(200, 400)),
        ("cyclic_100", cyclic_process(100)),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &payload, |b, payload| {
            b.iter(|| {
                let levels = assign_levels(black_box(&payload.activities), &payload.edges, 5);
                black_box(levels.capped);
            });
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = LayoutConfig::default();
    for (name, payload) in [
        ("chain_50", dense_process(50, 0)),
        ("dense_200", dense_process(200, 400)),
        ("cyclic_100", cyclic_process(100)),
    ] {
        for (label, toggles) in [("plain", Toggles::none()), ("annotated", Toggles::all())] {
            group.bench_with_input(
                BenchmarkId::new(label, name),
                &payload,
                |b, payload| {
                    b.iter(|| {
                        let layout = compute_layout(black_box(payload), toggles, &config);
                        black_box(layout.nodes.len());
                    });
                },
            );
        }
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    let theme = Theme::console();
    let config = LayoutConfig::default();
    let payload = dense_process(100, 150);
    let json = serde_json::to_string(&payload).unwrap_or_default();
    group.bench_function("json_to_svg_100", |b| {
        b.iter(|| {
            let payload = GraphPayload::from_json(black_box(&json)).unwrap_or_default();
            let layout = compute_layout(&payload, Toggles::all(), &config);
            let svg = render_svg(&layout, &theme);
            black_box(svg.len());
        });
    });
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_levels, bench_layout, bench_end_to_end
);
criterion_main!(benches);

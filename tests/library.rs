use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use approx::assert_relative_eq;
use rosterviz::{
    InteractionMode, MAX_ANCHOR_DISTANCE, MIN_GROUP_SEPARATION, NODE_RADIUS, Point,
    RESIZE_REHEAT_ALPHA, RosterDocument, RosterError, RosterGraph, Viewport, ZOOM_MAX,
    build_entities, compute_anchors, read_roster, render_svg,
};

fn fixture_document() -> RosterDocument {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/input/rosters.json");
    read_roster(&path).expect("fixture roster should parse")
}

fn graph_for(teams: &[&str], mode: InteractionMode) -> RosterGraph {
    let selected: Vec<String> = teams.iter().map(|team| team.to_string()).collect();
    let built = build_entities(&fixture_document(), &selected);
    RosterGraph::new(
        built.entities,
        built.groups,
        built.palette,
        Viewport::new(800.0, 500.0),
        mode,
    )
}

fn centroid(points: impl IntoIterator<Item = Point>) -> Point {
    let mut sum = Point::ZERO;
    let mut count = 0.0f32;
    for point in points {
        sum.x += point.x;
        sum.y += point.y;
        count += 1.0;
    }
    Point::new(sum.x / count, sum.y / count)
}

#[test]
fn anchors_cover_every_group_and_stay_separated() {
    let viewport = Viewport::new(800.0, 500.0);
    for n in 1..=9usize {
        let groups: Vec<String> = (0..n).map(|i| format!("T{i}")).collect();
        let anchors = compute_anchors(&groups, viewport);
        assert_eq!(anchors.len(), n);

        let points: Vec<Point> = groups.iter().map(|g| anchors[g]).collect();
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                let d = points[i].distance(points[j]);
                assert!(
                    d >= MIN_GROUP_SEPARATION - 1e-3,
                    "anchors {i} and {j} of {n} are only {d} apart"
                );
            }
        }
    }
}

#[test]
fn anchors_are_bit_identical_across_calls() {
    let viewport = Viewport::new(1024.0, 768.0);
    let groups: Vec<String> = ["GS", "LAL", "BOS", "MIA", "PHX"]
        .iter()
        .map(|g| g.to_string())
        .collect();
    let first = compute_anchors(&groups, viewport);
    let second = compute_anchors(&groups, viewport);
    assert_eq!(first, second);
}

#[test]
fn two_team_clusters_separate() {
    let mut graph = graph_for(&["GS", "LAL"], InteractionMode::Drag);
    graph.run(300);

    let mut by_group: HashMap<&str, Vec<Point>> = HashMap::new();
    for entity in graph.entities() {
        by_group
            .entry(entity.group.as_str())
            .or_default()
            .push(entity.position());
    }
    assert_eq!(by_group["GS"].len(), 5);
    assert_eq!(by_group["LAL"].len(), 5);

    let gs = centroid(by_group["GS"].iter().copied());
    let lal = centroid(by_group["LAL"].iter().copied());
    let separation = gs.distance(lal);
    assert!(
        separation >= MIN_GROUP_SEPARATION,
        "cluster centers are only {separation} apart"
    );
}

#[test]
fn pinned_entity_never_leaves_the_pin() {
    let mut graph = graph_for(&["GS"], InteractionMode::Drag);
    graph.run(50);

    let id = graph.entities()[0].id.clone();
    assert!(graph.drag_start(&id));
    assert!(graph.drag_move(&id, 100.0, 100.0));

    for _ in 0..30 {
        graph.step_once();
        let position = graph.positions()[&id];
        assert_eq!(position, Point::new(100.0, 100.0));
    }
}

#[test]
fn dragging_carries_the_group_anchor_along() {
    let mut graph = graph_for(&["GS"], InteractionMode::Drag);
    graph.run(50);

    let id = graph.entities()[0].id.clone();
    let start = graph.positions()[&id];
    let base = graph.anchors().base("GS").unwrap();

    assert!(graph.drag_start(&id));
    assert!(graph.drag_move(&id, 100.0, 100.0));

    // The accumulated group offset equals the total pointer delta, so the
    // effective anchor lands at the pointer minus the entity's relative
    // position within its cluster.
    let offset = graph.anchors().group_offset("GS");
    assert_relative_eq!(offset.x, 100.0 - start.x, epsilon = 1e-3);
    assert_relative_eq!(offset.y, 100.0 - start.y, epsilon = 1e-3);

    let effective = graph.anchors().effective("GS").unwrap();
    assert_relative_eq!(effective.x, base.x + offset.x, epsilon = 1e-3);
    assert_relative_eq!(effective.y, base.y + offset.y, epsilon = 1e-3);

    assert!(graph.drag_end(&id));
    let released = graph.entities().iter().find(|e| e.id == id).unwrap();
    assert!(!released.is_pinned());

    graph.run(60);
    let after = graph.positions()[&id];
    assert!(
        after.distance(Point::new(100.0, 100.0)) > 0.5,
        "entity should resume force-governed motion after release"
    );
}

#[test]
fn entities_stay_inside_their_territory() {
    let mut graph = graph_for(&["GS", "LAL", "BOS"], InteractionMode::Drag);
    graph.run(400);

    for entity in graph.entities() {
        let anchor = graph.anchors().effective(&entity.group).unwrap();
        let d = entity.position().distance(anchor);
        assert!(
            d <= MAX_ANCHOR_DISTANCE + 5.0,
            "{} drifted {d} from its anchor",
            entity.id
        );
    }
}

#[test]
fn collision_keeps_nodes_apart_after_settling() {
    let mut graph = graph_for(&["GS", "LAL", "BOS"], InteractionMode::Drag);
    graph.run(400);

    let entities = graph.entities();
    for i in 0..entities.len() {
        for j in (i + 1)..entities.len() {
            let d = entities[i].position().distance(entities[j].position());
            assert!(
                d >= 2.0 * NODE_RADIUS - 2.0,
                "{} and {} are only {d} apart",
                entities[i].id,
                entities[j].id
            );
        }
    }
}

#[test]
fn resize_recomputes_anchors_and_reheats() {
    let mut graph = graph_for(&["GS", "LAL"], InteractionMode::Drag);
    graph.run(400);
    assert!(graph.is_settled());

    graph.resize(400.0, 300.0);
    assert!(
        graph.alpha() >= RESIZE_REHEAT_ALPHA - 1e-3,
        "alpha was {} after resize",
        graph.alpha()
    );

    let expected = compute_anchors(
        &["GS".to_string(), "LAL".to_string()],
        Viewport::new(400.0, 300.0),
    );
    assert_eq!(graph.anchors().base("GS").unwrap(), expected["GS"]);
    assert_eq!(graph.anchors().base("LAL").unwrap(), expected["LAL"]);
}

#[test]
fn fetch_failure_becomes_the_unavailable_state() -> Result<()> {
    let error = read_roster(std::path::Path::new("/no/such/rosters.json")).unwrap_err();
    assert!(matches!(error, RosterError::Read { .. }));

    let mut graph = RosterGraph::unavailable(
        Viewport::new(800.0, 500.0),
        InteractionMode::Drag,
        error.to_string(),
    );
    assert!(graph.entities().is_empty());

    // Still steppable and renderable.
    graph.step_once();
    let svg = render_svg(&graph, "white")?;
    assert!(svg.contains("Roster data unavailable"));
    Ok(())
}

#[test]
fn empty_selection_renders_a_placeholder() -> Result<()> {
    let built = build_entities(&fixture_document(), &[]);
    assert!(built.entities.is_empty());

    let graph = RosterGraph::new(
        built.entities,
        built.groups,
        built.palette,
        Viewport::new(800.0, 500.0),
        InteractionMode::Drag,
    );
    let svg = render_svg(&graph, "white")?;
    assert!(svg.contains("No teams selected"));
    Ok(())
}

#[test]
fn zoom_is_bounded_and_hit_tests_respect_it() {
    let mut graph = graph_for(&["GS", "LAL"], InteractionMode::Drag);
    graph.run(300);

    let focal = Point::new(400.0, 250.0);
    graph.zoom(10.0, focal);
    assert_eq!(graph.transform().scale, ZOOM_MAX);

    let entity = &graph.entities()[0];
    let id = entity.id.clone();
    let screen = graph.transform().to_screen(entity.position());
    let hit = graph.entity_at(screen).expect("entity should be under its own screen point");
    assert_eq!(hit.id, id);
}

#[test]
fn pan_mode_shifts_every_group_together() {
    let mut graph = graph_for(&["GS", "LAL"], InteractionMode::Pan);
    let before_gs = graph.anchors().effective("GS").unwrap();
    let before_lal = graph.anchors().effective("LAL").unwrap();

    assert!(graph.pan(30.0, -10.0));
    let after_gs = graph.anchors().effective("GS").unwrap();
    let after_lal = graph.anchors().effective("LAL").unwrap();
    assert_eq!(after_gs, Point::new(before_gs.x + 30.0, before_gs.y - 10.0));
    assert_eq!(after_lal, Point::new(before_lal.x + 30.0, before_lal.y - 10.0));

    // Entity drags are rejected in pan mode, and vice versa.
    let id = graph.entities()[0].id.clone();
    assert!(!graph.drag_start(&id));

    let mut drag_graph = graph_for(&["GS"], InteractionMode::Drag);
    assert!(!drag_graph.pan(5.0, 5.0));
}

#[test]
fn athletes_without_ids_are_skipped() {
    let built = build_entities(&fixture_document(), &["BOS".to_string()]);
    assert_eq!(built.skipped, 1);
    assert_eq!(built.entities.len(), 2);
    // shortName is missing for one Celtic; the full name steps in.
    assert!(built.entities.iter().any(|e| e.label == "Jaylen Brown"));
}

#[test]
fn svg_snapshot_lists_every_node_and_team() -> Result<()> {
    let mut graph = graph_for(&["GS", "LAL"], InteractionMode::Drag);
    graph.run(50);

    let svg = render_svg(&graph, "white")?;
    assert!(svg.contains("<svg"));
    assert!(svg.contains(">GS<"));
    assert!(svg.contains(">LAL<"));
    assert_eq!(svg.matches("class=\"node\"").count(), graph.entities().len());
    // Hover detail rides along as a <title> per node.
    assert!(svg.contains("<title>S. Curry · Golden State Warriors #30</title>"));
    Ok(())
}

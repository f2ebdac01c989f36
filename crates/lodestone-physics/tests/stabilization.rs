//! End-to-end stabilization scenarios.

use lodestone_core::{EdgeId, GraphView, NodeId, PhysicsEdge, PhysicsNode};
use lodestone_physics::{
    PhysicsOptions, PhysicsOptionsPatch, Simulation, SolverModel, DEFAULT_MAX_ITERATIONS,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn ring_graph(n: u64) -> GraphView {
    let mut graph = GraphView::new();
    for i in 0..n {
        let angle = i as f64 / n as f64 * std::f64::consts::TAU;
        graph.add_node(PhysicsNode::new(
            NodeId(i),
            120.0 * angle.cos(),
            120.0 * angle.sin(),
        ));
    }
    for i in 0..n {
        graph.add_edge(PhysicsEdge::new(EdgeId(i), NodeId(i), NodeId((i + 1) % n)));
    }
    graph
}

fn positions(sim: &Simulation) -> Vec<(NodeId, f64, f64)> {
    sim.graph()
        .node_ids()
        .map(|id| {
            let node = sim.graph().node(id).unwrap();
            (id, node.x, node.y)
        })
        .collect()
}

#[test]
fn small_graph_stabilizes_within_the_default_cap() {
    init_tracing();
    let mut sim = Simulation::new(ring_graph(8), PhysicsOptions::default()).unwrap();
    let outcome = sim.stabilize(DEFAULT_MAX_ITERATIONS);
    assert!(outcome.stabilized, "ran {} iterations", outcome.iterations);
    assert!(outcome.iterations < DEFAULT_MAX_ITERATIONS);
}

#[test]
fn identical_seeds_reproduce_identical_layouts() {
    let run = || {
        let mut sim = Simulation::new(ring_graph(8), PhysicsOptions::default()).unwrap();
        sim.stabilize(DEFAULT_MAX_ITERATIONS);
        positions(&sim)
    };
    assert_eq!(run(), run());
}

#[test]
fn pinned_axes_never_move() {
    let mut graph = ring_graph(6);
    graph.node_mut(NodeId(0)).unwrap().fixed_x = true;
    graph.node_mut(NodeId(0)).unwrap().fixed_y = true;
    graph.node_mut(NodeId(1)).unwrap().fixed_y = true;
    let pinned_before = {
        let n = graph.node(NodeId(0)).unwrap();
        (n.x, n.y)
    };
    let half_pinned_before = graph.node(NodeId(1)).unwrap().y;

    let mut sim = Simulation::new(graph, PhysicsOptions::default()).unwrap();
    sim.stabilize(DEFAULT_MAX_ITERATIONS);

    let pinned = sim.graph().node(NodeId(0)).unwrap();
    assert_eq!((pinned.x, pinned.y), pinned_before);
    let half_pinned = sim.graph().node(NodeId(1)).unwrap();
    assert_eq!(half_pinned.y, half_pinned_before);
    // The free axis of the half-pinned node did move.
    assert_ne!(half_pinned.x, 120.0 * (std::f64::consts::TAU / 6.0).cos());
}

#[test]
fn restabilizing_a_stable_layout_is_cheap() {
    let mut sim = Simulation::new(ring_graph(8), PhysicsOptions::default()).unwrap();
    sim.stabilize(DEFAULT_MAX_ITERATIONS);
    let settled = positions(&sim);

    let outcome = sim.stabilize(DEFAULT_MAX_ITERATIONS);
    assert!(outcome.stabilized);
    assert!(outcome.iterations <= 2, "took {}", outcome.iterations);
    for ((id, x0, y0), (_, x1, y1)) in settled.iter().zip(positions(&sim)) {
        let displacement = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
        assert!(displacement < 1.0, "node {id:?} drifted {displacement}");
    }
}

#[test]
fn interrupt_stops_the_loop_before_the_cap() {
    let mut graph = ring_graph(8);
    // Spread the ring out so it cannot converge in a couple of steps.
    for id in graph.node_ids().collect::<Vec<_>>() {
        let node = graph.node_mut(id).unwrap();
        node.x *= 10.0;
        node.y *= 10.0;
    }
    let mut sim = Simulation::new(graph, PhysicsOptions::default()).unwrap();
    let handle = sim.interrupt_handle();
    sim.on_progress(
        1,
        Box::new(move |_iteration, _max_speed| {
            handle.interrupt();
        }),
    );
    let outcome = sim.stabilize(DEFAULT_MAX_ITERATIONS);
    assert!(!outcome.stabilized);
    assert!(outcome.iterations <= 2, "took {}", outcome.iterations);
}

#[test]
fn progress_callback_fires_at_the_configured_interval() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let mut sim = Simulation::new(ring_graph(8), PhysicsOptions::default()).unwrap();
    sim.on_progress(
        10,
        Box::new(move |iteration, _| {
            assert_eq!(iteration % 10, 0);
            seen.fetch_add(1, Ordering::Relaxed);
        }),
    );
    let outcome = sim.stabilize(DEFAULT_MAX_ITERATIONS);
    assert_eq!(calls.load(Ordering::Relaxed), outcome.iterations / 10);
}

#[test]
fn json_patch_reconfigures_the_running_simulation() {
    let mut sim = Simulation::new(ring_graph(8), PhysicsOptions::default()).unwrap();
    let patch: PhysicsOptionsPatch = serde_json::from_str(
        r#"{"solver": "forceAtlas2Based", "springLength": 150.0, "unknownKnob": true}"#,
    )
    .unwrap();
    sim.set_options(&patch);
    assert_eq!(sim.options().solver, SolverModel::ForceAtlas2Based);
    assert_eq!(sim.options().spring_length, 150.0);
    // Untouched fields keep the previous model's values.
    assert_eq!(sim.options().central_gravity, 0.3);

    let outcome = sim.stabilize(DEFAULT_MAX_ITERATIONS);
    assert!(outcome.stabilized);
}

#[test]
fn hierarchical_model_separates_levels() {
    let mut graph = GraphView::new();
    graph.add_node(PhysicsNode::new(NodeId(1), 0.0, 0.0).with_level(0));
    graph.add_node(PhysicsNode::new(NodeId(2), 1.0, 100.0).with_level(1));
    graph.add_node(PhysicsNode::new(NodeId(3), -1.0, 100.0).with_level(1));
    graph.add_edge(PhysicsEdge::new(EdgeId(1), NodeId(1), NodeId(2)));
    graph.add_edge(PhysicsEdge::new(EdgeId(2), NodeId(1), NodeId(3)));

    let mut sim = Simulation::new(graph, PhysicsOptions::hierarchical()).unwrap();
    sim.stabilize(DEFAULT_MAX_ITERATIONS);

    let a = sim.graph().node(NodeId(2)).unwrap();
    let b = sim.graph().node(NodeId(3)).unwrap();
    let separation = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
    // Same-level siblings are pushed toward the configured node distance.
    assert!(separation > 10.0, "siblings only {separation} apart");
}

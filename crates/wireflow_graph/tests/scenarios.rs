// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end graph behavior: building, editing, rewiring and reloading.

use std::path::PathBuf;
use wireflow_graph::nodes::{
    ArithmeticOp, FileNode, MathFunction, MathFunctionNode, OutputNode, TimeSeriesNode, UNDEFINED,
};
use wireflow_graph::{
    Edit, Graph, GraphError, GraphSnapshot, NodeError, NodeId, NodeKind, Rejection, SinkRef,
    SourceRef, Value,
};

fn type_in(graph: &mut Graph, node: NodeId, field: usize, text: &str) {
    graph
        .edit(
            node,
            Edit::Field {
                field,
                text: text.to_string(),
            },
        )
        .unwrap();
}

fn wire(graph: &mut Graph, from: NodeId, to: NodeId, sink: usize) {
    graph
        .connect(SourceRef::new(from, 0), SinkRef::new(to, sink))
        .unwrap();
}

fn shown(graph: &Graph, output: NodeId) -> Option<Value> {
    graph.node_as::<OutputNode>(output).unwrap().value().cloned()
}

/// Two inputs feeding an adder feeding an output
fn adder(a: &str, b: &str) -> (Graph, [NodeId; 4]) {
    let mut graph = Graph::new();
    let first = graph.add_node(NodeKind::Input, [0.0, 0.0]);
    let second = graph.add_node(NodeKind::Input, [0.0, 80.0]);
    let sum = graph.add_node(NodeKind::Arithmetic, [150.0, 40.0]);
    let output = graph.add_node(NodeKind::Output, [300.0, 40.0]);
    wire(&mut graph, first, sum, 0);
    wire(&mut graph, second, sum, 1);
    wire(&mut graph, sum, output, 0);
    type_in(&mut graph, first, 0, a);
    type_in(&mut graph, second, 0, b);
    (graph, [first, second, sum, output])
}

#[test]
fn adds_and_clears() {
    let (mut graph, [first, _, _, output]) = adder("3", "4");
    assert_eq!(shown(&graph, output), Some(Value::Decimal(7.0)));

    type_in(&mut graph, first, 0, "");
    assert_eq!(shown(&graph, output), None);
    assert_eq!(graph.node_as::<OutputNode>(output).unwrap().text(), UNDEFINED);

    type_in(&mut graph, first, 0, "10");
    assert_eq!(shown(&graph, output), Some(Value::Decimal(14.0)));
}

#[test]
fn division_by_zero_follows_ieee() {
    let mut graph = Graph::new();
    let op = graph.add_node(NodeKind::Arithmetic, [0.0, 0.0]);
    let output = graph.add_node(NodeKind::Output, [100.0, 0.0]);
    wire(&mut graph, op, output, 0);

    let divide = ArithmeticOp::ALL
        .iter()
        .position(|op| *op == ArithmeticOp::Divide)
        .unwrap();
    graph.edit(op, Edit::Select(divide)).unwrap();
    type_in(&mut graph, op, 0, "1");
    type_in(&mut graph, op, 1, "0");
    assert_eq!(shown(&graph, output), Some(Value::Decimal(f32::INFINITY)));

    graph.edit(op, Edit::Select(divide + 1)).unwrap();
    match shown(&graph, output) {
        Some(Value::Decimal(x)) => assert!(x.is_nan()),
        other => panic!("expected NaN, got {other:?}"),
    }
}

#[test]
fn type_mismatch_is_rejected() {
    let mut graph = Graph::new();
    let file = graph.add_node(NodeKind::File, [0.0, 0.0]);
    let clock = graph.add_node(NodeKind::Clock, [100.0, 0.0]);
    let err = graph
        .connect(SourceRef::new(file, 0), SinkRef::new(clock, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        GraphError::Rejected(Rejection::TypeMismatch { .. })
    ));
    assert_eq!(graph.wire_count(), 0);
}

#[test]
fn cycles_are_rejected() {
    let mut graph = Graph::new();
    let a = graph.add_node(NodeKind::Inverter, [0.0, 0.0]);
    let b = graph.add_node(NodeKind::Inverter, [100.0, 0.0]);
    let c = graph.add_node(NodeKind::Inverter, [200.0, 0.0]);
    wire(&mut graph, a, b, 0);
    wire(&mut graph, b, c, 0);

    let err = graph
        .connect(SourceRef::new(c, 0), SinkRef::new(a, 0))
        .unwrap_err();
    assert_eq!(err, GraphError::Rejected(Rejection::Cycle));
    assert_eq!(graph.wire_count(), 2);
}

#[test]
fn reconnecting_a_sink_replaces_its_wire() {
    let mut graph = Graph::new();
    let first = graph.add_node(NodeKind::Input, [0.0, 0.0]);
    let second = graph.add_node(NodeKind::Input, [0.0, 80.0]);
    let output = graph.add_node(NodeKind::Output, [150.0, 40.0]);
    type_in(&mut graph, first, 0, "1");
    type_in(&mut graph, second, 0, "2");

    wire(&mut graph, first, output, 0);
    assert_eq!(shown(&graph, output), Some(Value::Decimal(1.0)));
    wire(&mut graph, second, output, 0);

    assert_eq!(graph.wire_count(), 1);
    assert!(graph.source_wires(SourceRef::new(first, 0)).is_empty());
    assert_eq!(shown(&graph, output), Some(Value::Decimal(2.0)));
}

#[test]
fn disconnecting_resets_downstream() {
    let mut graph = Graph::new();
    let input = graph.add_node(NodeKind::Input, [0.0, 0.0]);
    let inverter = graph.add_node(NodeKind::Inverter, [100.0, 0.0]);
    let output = graph.add_node(NodeKind::Output, [200.0, 0.0]);
    wire(&mut graph, input, inverter, 0);
    wire(&mut graph, inverter, output, 0);
    type_in(&mut graph, input, 0, "5");
    assert_eq!(shown(&graph, output), Some(Value::Decimal(-5.0)));

    let removed = graph.disconnect_sink(SinkRef::new(inverter, 0)).unwrap();
    assert!(removed.is_some());
    assert_eq!(shown(&graph, output), None);
    assert_eq!(graph.disconnect_sink(SinkRef::new(inverter, 0)).unwrap(), None);
}

#[test]
fn saved_graph_recomputes_on_load() {
    let (graph, _) = adder("3", "4");
    let text = ron::ser::to_string_pretty(&graph.snapshot(), ron::ser::PrettyConfig::default())
        .unwrap();

    let snapshot: GraphSnapshot = ron::from_str(&text).unwrap();
    let restored = Graph::from_snapshot(&snapshot).unwrap();
    assert_eq!(restored.node_count(), 4);
    assert_eq!(restored.wire_count(), 3);

    let output = restored
        .nodes()
        .find(|(_, entry)| entry.kind() == NodeKind::Output)
        .map(|(id, _)| id)
        .unwrap();
    assert_eq!(shown(&restored, output), Some(Value::Decimal(7.0)));
}

#[test]
fn removing_a_node_leaves_no_dangling_wires() {
    let (mut graph, [first, second, sum, output]) = adder("3", "4");
    graph.remove_node(sum).unwrap();

    assert_eq!(graph.wire_count(), 0);
    assert!(graph.source_wires(SourceRef::new(first, 0)).is_empty());
    assert!(graph.source_wires(SourceRef::new(second, 0)).is_empty());
    assert_eq!(graph.sink_wire(SinkRef::new(output, 0)), None);
    assert_eq!(shown(&graph, output), None);
    assert!(matches!(
        graph.remove_node(sum),
        Err(GraphError::NodeNotFound(_))
    ));
}

#[test]
fn switching_to_a_unary_function_detaches_the_second_term() {
    let mut graph = Graph::new();
    let base = graph.add_node(NodeKind::Input, [0.0, 0.0]);
    let exponent = graph.add_node(NodeKind::Input, [0.0, 80.0]);
    let function = graph.add_node(NodeKind::MathFunction, [150.0, 40.0]);
    let output = graph.add_node(NodeKind::Output, [300.0, 40.0]);
    type_in(&mut graph, base, 0, "2");
    type_in(&mut graph, exponent, 0, "3");

    // sine is the default and takes one term
    let err = graph
        .connect(SourceRef::new(exponent, 0), SinkRef::new(function, 1))
        .unwrap_err();
    assert_eq!(err, GraphError::Rejected(Rejection::SinkDisabled));

    graph
        .edit(function, Edit::Select(function_index(MathFunction::Pow)))
        .unwrap();
    wire(&mut graph, base, function, 0);
    wire(&mut graph, exponent, function, 1);
    wire(&mut graph, function, output, 0);
    assert_eq!(shown(&graph, output), Some(Value::Decimal(8.0)));

    graph
        .edit(function, Edit::Select(function_index(MathFunction::Round)))
        .unwrap();
    assert_eq!(graph.sink_wire(SinkRef::new(function, 1)), None);
    assert_eq!(graph.wire_count(), 2);
    assert_eq!(
        graph.node_as::<MathFunctionNode>(function).unwrap().function(),
        MathFunction::Round
    );
    assert_eq!(shown(&graph, output), Some(Value::Decimal(2.0)));
}

fn updates(graph: &Graph, output: NodeId) -> usize {
    graph.node_as::<OutputNode>(output).unwrap().updates()
}

fn function_index(function: MathFunction) -> usize {
    MathFunction::ALL.iter().position(|f| *f == function).unwrap()
}

#[test]
fn each_change_reaches_the_output_once() {
    let mut graph = Graph::new();
    let base = graph.add_node(NodeKind::Input, [0.0, 0.0]);
    let exponent = graph.add_node(NodeKind::Input, [0.0, 80.0]);
    let spare = graph.add_node(NodeKind::Input, [0.0, 160.0]);
    let function = graph.add_node(NodeKind::MathFunction, [150.0, 40.0]);
    let output = graph.add_node(NodeKind::Output, [300.0, 40.0]);
    type_in(&mut graph, base, 0, "2");
    type_in(&mut graph, exponent, 0, "3");
    type_in(&mut graph, spare, 0, "5");
    graph
        .edit(function, Edit::Select(function_index(MathFunction::Pow)))
        .unwrap();
    wire(&mut graph, base, function, 0);
    wire(&mut graph, exponent, function, 1);
    wire(&mut graph, function, output, 0);
    assert_eq!(shown(&graph, output), Some(Value::Decimal(8.0)));
    let mut seen = updates(&graph, output);

    type_in(&mut graph, base, 0, "3");
    assert_eq!(shown(&graph, output), Some(Value::Decimal(27.0)));
    assert_eq!(updates(&graph, output), seen + 1);
    seen += 1;

    graph
        .edit(function, Edit::Select(function_index(MathFunction::Min)))
        .unwrap();
    assert_eq!(shown(&graph, output), Some(Value::Decimal(3.0)));
    assert_eq!(updates(&graph, output), seen + 1);
    seen += 1;

    // the old wire's reset, then the new value
    wire(&mut graph, spare, function, 0);
    assert_eq!(shown(&graph, output), Some(Value::Decimal(3.0)));
    assert_eq!(updates(&graph, output), seen + 2);
    seen += 2;

    graph
        .edit(function, Edit::Select(function_index(MathFunction::Round)))
        .unwrap();
    assert_eq!(shown(&graph, output), Some(Value::Decimal(5.0)));
    assert_eq!(updates(&graph, output), seen + 1);
    seen += 1;

    // the exponent no longer drives anything
    type_in(&mut graph, exponent, 0, "7");
    assert_eq!(updates(&graph, output), seen);
}

#[test]
fn file_choices_are_not_started_by_a_press() {
    let mut graph = Graph::new();
    let file = graph.add_node(NodeKind::File, [0.0, 0.0]);
    let output = graph.add_node(NodeKind::Output, [150.0, 0.0]);
    wire(&mut graph, file, output, 0);

    let err = graph.edit(file, Edit::Press).unwrap_err();
    assert!(matches!(
        err,
        GraphError::Node {
            source: NodeError::UnsupportedEdit { .. },
            ..
        }
    ));
    assert!(!graph.node_as::<FileNode>(file).unwrap().is_choosing());

    graph
        .edit(file, Edit::FileChosen(Some(PathBuf::from("levels.csv"))))
        .unwrap();
    assert_eq!(shown(&graph, output), Some(Value::Text("levels.csv".to_string())));
    graph.edit(file, Edit::Clear).unwrap();
    assert_eq!(shown(&graph, output), None);
    assert!(graph.node_as::<FileNode>(file).unwrap().filename().is_none());
}

#[test]
fn clock_ticks_drive_plots() {
    let mut graph = Graph::new();
    let clock = graph.add_node(NodeKind::Clock, [0.0, 0.0]);
    let plot = graph.add_node(NodeKind::TimeSeries, [150.0, 0.0]);
    let output = graph.add_node(NodeKind::Output, [150.0, 80.0]);
    wire(&mut graph, clock, plot, 0);
    wire(&mut graph, clock, output, 0);
    type_in(&mut graph, clock, 0, "2");

    graph.tick(0.75, 0.75).unwrap();
    assert_eq!(shown(&graph, output), Some(Value::Decimal(0.25)));
    let points: Vec<[f32; 2]> = graph
        .node_as::<TimeSeriesNode>(plot)
        .unwrap()
        .points()
        .collect();
    // the plot ticks after the clock, so the step has already scrolled once
    assert_eq!(points, vec![[-0.75, 0.25], [0.0, 0.25]]);
}

#[test]
fn pasted_selection_is_independent() {
    let (mut graph, [first, _, sum, _]) = adder("3", "4");
    graph.select(first, true).unwrap();
    graph.select(sum, true).unwrap();

    let copied = graph.snapshot_of(&graph.selected_ids());
    assert_eq!(copied.wires.len(), 1);
    let pasted = graph.paste(&copied, [30.0, 30.0]).unwrap();
    assert_eq!(graph.node_count(), 6);

    // the copied adder keeps the last value its second term saw, but only
    // its first term is wired
    let pasted_output = graph.add_node(NodeKind::Output, [400.0, 0.0]);
    wire(&mut graph, pasted[1], pasted_output, 0);
    assert_eq!(shown(&graph, pasted_output), Some(Value::Decimal(7.0)));
    type_in(&mut graph, pasted[1], 1, "1");
    assert_eq!(shown(&graph, pasted_output), Some(Value::Decimal(4.0)));

    type_in(&mut graph, first, 0, "5");
    assert_eq!(shown(&graph, pasted_output), Some(Value::Decimal(4.0)));
    type_in(&mut graph, pasted[0], 0, "5");
    assert_eq!(shown(&graph, pasted_output), Some(Value::Decimal(6.0)));
}

#[test]
fn bad_text_becomes_a_diagnostic() {
    let mut graph = Graph::new();
    let op = graph.add_node(NodeKind::Arithmetic, [0.0, 0.0]);
    let err = graph
        .edit(
            op,
            Edit::Field {
                field: 0,
                text: "three".to_string(),
            },
        )
        .unwrap_err();
    assert!(!err.is_invariant_violation());
    assert!(graph.diagnostic(op).is_some());

    type_in(&mut graph, op, 0, "3");
    assert!(graph.diagnostic(op).is_none());
}

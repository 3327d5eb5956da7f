use std::collections::BTreeMap;

use crate::config::SankeyConfig;
use crate::ir::{FlowSpec, NodeAddress};

use super::types::{FlowPoint, FlowSegment, LayerLayout};

/// Scratch copy of one flow; the routing loop consumes its path front to
/// back, the caller's flows are never touched.
#[derive(Debug, Clone)]
struct PendingFlow {
    magnitude: f32,
    /// Full original path, kept for the segment's selection tags.
    passes: Vec<NodeAddress>,
    /// Remaining waypoints; the first element is the current source.
    path: Vec<NodeAddress>,
}

/// Per-node vertical allocation cursors, scoped to one routing pass.
#[derive(Debug, Default)]
struct Cursors {
    filled_out: BTreeMap<NodeAddress, f32>,
    filled_in: BTreeMap<NodeAddress, f32>,
}

/// Route every flow into per-hop polygons. Flows sharing a node stack in
/// lexicographic (source address, target address) order, resolved strictly
/// left to right so a node's cursors only advance for hops actually
/// departing or arriving in the current pass. Deterministic: identical
/// inputs produce identical segment order.
pub(super) fn route_flows(
    layers: &[LayerLayout],
    flows: &[FlowSpec],
    y_scale: f32,
    config: &SankeyConfig,
) -> Vec<FlowSegment> {
    let mut pending: Vec<PendingFlow> = flows
        .iter()
        .map(|flow| PendingFlow {
            magnitude: flow.magnitude,
            passes: flow.path.clone(),
            path: flow.path.clone(),
        })
        .collect();

    let node_top = |addr: NodeAddress| -> (f32, f32) {
        let node = &layers[addr.layer].groups[addr.group].nodes[addr.node];
        (node.x, node.y)
    };

    let mut cursors = Cursors::default();
    let mut segments: Vec<FlowSegment> = Vec::new();

    loop {
        pending.retain(|flow| flow.path.len() > 1);
        if pending.is_empty() {
            return segments;
        }

        pending.sort_by(|a, b| {
            a.path[0]
                .cmp(&b.path[0])
                .then_with(|| a.path[1].cmp(&b.path[1]))
        });

        // Only hops departing the leftmost remaining layer are resolved
        // this pass; the rest wait.
        let layer_idx = pending[0].path[0].layer;
        for flow in &mut pending {
            if flow.path[0].layer != layer_idx {
                continue;
            }
            let from = flow.path[0];
            let to = flow.path[1];
            let height = flow.magnitude * y_scale;

            let (source_x, source_top) = node_top(from);
            let (target_x, target_top) = node_top(to);

            let source_y0 = *cursors.filled_out.entry(from).or_insert(source_top);
            let source_y1 = source_y0 + height;
            cursors.filled_out.insert(from, source_y1);

            let target_y0 = *cursors.filled_in.entry(to).or_insert(target_top);
            let target_y1 = target_y0 + height;
            cursors.filled_in.insert(to, target_y1);

            let source_right = source_x + config.node_width;
            segments.push(FlowSegment {
                from,
                to,
                magnitude: flow.magnitude,
                height,
                passes: flow.passes.clone(),
                points: [
                    FlowPoint {
                        x: source_right,
                        y0: source_y0,
                        y1: source_y1,
                    },
                    FlowPoint {
                        x: source_right + config.flow_lead_width,
                        y0: source_y0,
                        y1: source_y1,
                    },
                    FlowPoint {
                        x: target_x - config.flow_lead_width,
                        y0: target_y0,
                        y1: target_y1,
                    },
                    FlowPoint {
                        x: target_x,
                        y0: target_y0,
                        y1: target_y1,
                    },
                ],
            });

            flow.path.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SankeyConfig;
    use crate::ir::{Dataset, FlowSpec, GroupSpec, LayerSpec, NodeSpec};
    use crate::layout::{compute_layout, SankeyLayout};
    use crate::theme::Theme;

    fn node(title: &str) -> NodeSpec {
        NodeSpec {
            title: title.to_string(),
            color: None,
        }
    }

    fn group(nodes: Vec<NodeSpec>) -> GroupSpec {
        GroupSpec {
            title: None,
            label_direction: 0,
            nodes,
        }
    }

    fn layer(x: f32, groups: Vec<GroupSpec>) -> LayerSpec {
        LayerSpec {
            title: String::new(),
            x,
            groups,
        }
    }

    fn flow(magnitude: f32, path: &[[usize; 3]]) -> FlowSpec {
        FlowSpec {
            magnitude,
            path: path.iter().map(|&addr| addr.into()).collect(),
        }
    }

    fn compute(dataset: &Dataset) -> SankeyLayout {
        compute_layout(dataset, &Theme::default(), &SankeyConfig::default()).unwrap()
    }

    #[test]
    fn single_flow_spans_both_full_bands() {
        let dataset = Dataset {
            layers: vec![
                layer(0.0, vec![group(vec![node("a")])]),
                layer(1.0, vec![group(vec![node("b")])]),
            ],
            flows: vec![flow(10.0, &[[0, 0, 0], [1, 0, 0]])],
        };
        let layout = compute(&dataset);
        assert_eq!(layout.flows.len(), 1);
        let segment = &layout.flows[0];
        assert!((segment.height - 10.0 * layout.y_scale).abs() < 1e-3);

        let source = layout.node([0, 0, 0].into()).unwrap();
        let target = layout.node([1, 0, 0].into()).unwrap();
        let [p0, p1, p2, p3] = segment.points;
        // Band covers each node's full height.
        assert!((p0.y0 - source.y).abs() < 1e-3);
        assert!((p0.y1 - (source.y + source.height)).abs() < 1e-3);
        assert!((p3.y0 - target.y).abs() < 1e-3);
        assert!((p3.y1 - (target.y + target.height)).abs() < 1e-3);
        // Fixed horizontal lead before the curve on both sides.
        assert_eq!(p0.x, source.x + source.width);
        assert_eq!(p1.x, p0.x + 20.0);
        assert_eq!(p2.x, target.x - 20.0);
        assert_eq!(p3.x, target.x);
    }

    #[test]
    fn multi_hop_flow_produces_one_segment_per_hop() {
        let dataset = Dataset {
            layers: vec![
                layer(0.0, vec![group(vec![node("a")])]),
                layer(0.5, vec![group(vec![node("m")])]),
                layer(1.0, vec![group(vec![node("z")])]),
            ],
            flows: vec![flow(4.0, &[[0, 0, 0], [1, 0, 0], [2, 0, 0]])],
        };
        let layout = compute(&dataset);
        assert_eq!(layout.flows.len(), 2);
        let first = &layout.flows[0];
        let second = &layout.flows[1];
        assert_eq!(first.from, [0, 0, 0].into());
        assert_eq!(first.to, [1, 0, 0].into());
        assert_eq!(second.from, [1, 0, 0].into());
        assert_eq!(second.to, [2, 0, 0].into());
        // Matching band heights at the shared intermediate node: no
        // vertical jump across the hop boundary.
        assert!((first.height - second.height).abs() < 1e-3);
        assert!((first.points[3].y0 - second.points[0].y0).abs() < 1e-3);
        // Both segments carry the full path tag.
        let passes: Vec<NodeAddress> = vec![[0, 0, 0].into(), [1, 0, 0].into(), [2, 0, 0].into()];
        assert_eq!(first.passes, passes);
        assert_eq!(second.passes, passes);
    }

    #[test]
    fn flow_band_totals_match_node_sizes() {
        let dataset = Dataset {
            layers: vec![
                layer(0.0, vec![group(vec![node("a"), node("b")])]),
                layer(0.5, vec![group(vec![node("m"), node("n")])]),
                layer(1.0, vec![group(vec![node("x")]), group(vec![node("y")])]),
            ],
            flows: vec![
                flow(3.0, &[[0, 0, 0], [1, 0, 0], [2, 0, 0]]),
                flow(2.0, &[[0, 0, 0], [1, 0, 1], [2, 1, 0]]),
                flow(4.0, &[[0, 0, 1], [1, 0, 0], [2, 0, 0]]),
                flow(1.0, &[[0, 0, 1], [1, 0, 1], [2, 0, 0]]),
            ],
        };
        let layout = compute(&dataset);
        for node in layout.nodes() {
            let entering: f32 = layout
                .flows
                .iter()
                .filter(|segment| segment.to == node.address)
                .map(|segment| segment.height)
                .sum();
            let leaving: f32 = layout
                .flows
                .iter()
                .filter(|segment| segment.from == node.address)
                .map(|segment| segment.height)
                .sum();
            assert!(
                (entering - node.size_in * layout.y_scale).abs() < 1e-2,
                "node {}: entering {} != size_in {}",
                node.address,
                entering,
                node.size_in * layout.y_scale
            );
            assert!(
                (leaving - node.size_out * layout.y_scale).abs() < 1e-2,
                "node {}: leaving {} != size_out {}",
                node.address,
                leaving,
                node.size_out * layout.y_scale
            );
        }
    }

    #[test]
    fn flows_sharing_a_node_stack_in_address_order_without_overlap() {
        let dataset = Dataset {
            layers: vec![
                layer(
                    0.0,
                    vec![group(vec![node("a")]), group(vec![node("b")])],
                ),
                layer(1.0, vec![group(vec![node("z")])]),
            ],
            flows: vec![
                // Declared out of address order on purpose.
                flow(4.0, &[[0, 1, 0], [1, 0, 0]]),
                flow(6.0, &[[0, 0, 0], [1, 0, 0]]),
            ],
        };
        let layout = compute(&dataset);
        assert_eq!(layout.flows.len(), 2);
        // Sorted order puts the group-0 source first.
        assert_eq!(layout.flows[0].from, [0, 0, 0].into());
        assert_eq!(layout.flows[1].from, [0, 1, 0].into());
        // Inbound bands at the shared target tile without overlap.
        let first = &layout.flows[0].points[3];
        let second = &layout.flows[1].points[3];
        assert!((second.y0 - first.y1).abs() < 1e-3);

        let target = layout.node([1, 0, 0].into()).unwrap();
        assert!((first.y0 - target.y).abs() < 1e-3);
        assert!((second.y1 - (target.y + target.height)).abs() < 1e-3);
    }

    #[test]
    fn hops_resolve_left_to_right() {
        // A short flow declared after a long one: the long flow's second
        // hop must not advance layer-1 cursors before the short flow's
        // first hop arrives there.
        let dataset = Dataset {
            layers: vec![
                layer(0.0, vec![group(vec![node("a"), node("b")])]),
                layer(0.5, vec![group(vec![node("m")])]),
                layer(1.0, vec![group(vec![node("z")])]),
            ],
            flows: vec![
                flow(2.0, &[[0, 0, 0], [1, 0, 0], [2, 0, 0]]),
                flow(3.0, &[[0, 0, 1], [1, 0, 0], [2, 0, 0]]),
            ],
        };
        let layout = compute(&dataset);
        assert_eq!(layout.flows.len(), 4);
        // First two segments depart layer 0, the rest layer 1.
        assert_eq!(layout.flows[0].from.layer, 0);
        assert_eq!(layout.flows[1].from.layer, 0);
        assert_eq!(layout.flows[2].from.layer, 1);
        assert_eq!(layout.flows[3].from.layer, 1);

        // Outbound bands at the shared intermediate node tile in the
        // same order as the inbound ones.
        let m = layout.node([1, 0, 0].into()).unwrap();
        assert!((layout.flows[2].points[0].y0 - m.y).abs() < 1e-3);
        assert!((layout.flows[3].points[0].y0 - layout.flows[2].points[0].y1).abs() < 1e-3);
    }

    #[test]
    fn segment_class_string_carries_path_tags() {
        let dataset = Dataset {
            layers: vec![
                layer(0.0, vec![group(vec![node("a")])]),
                layer(0.5, vec![group(vec![node("m")])]),
                layer(1.0, vec![group(vec![node("z")])]),
            ],
            flows: vec![flow(1.0, &[[0, 0, 0], [1, 0, 0], [2, 0, 0]])],
        };
        let layout = compute(&dataset);
        let class = layout.flows[0].css_class();
        assert_eq!(
            class,
            "flow passes-0-0-0 passes-1-0-0 passes-2-0-0 from-0-0-0 to-1-0-0"
        );
        assert!(layout.flows[0].passes_through([2, 0, 0].into()));
        assert!(!layout.flows[0].passes_through([2, 0, 1].into()));
    }
}

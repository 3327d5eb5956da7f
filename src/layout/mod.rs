mod error;
mod routing;
pub(crate) mod types;

pub use error::{LayoutError, LayoutWarning};
pub use types::*;

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::{SankeyConfig, VerticalAlign};
use crate::ir::{Dataset, NodeAddress};
use crate::theme::{Color, Theme};

/// Per-entity flow totals accumulated before any geometry exists.
#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    size_in: f32,
    size_out: f32,
}

impl Totals {
    fn size(&self) -> f32 {
        self.size_in.max(self.size_out)
    }
}

/// Fixed vertical space a layer consumes regardless of scale.
#[derive(Debug, Clone, Copy, Default)]
struct LayerSpacing {
    non_empty_groups: usize,
    group_gaps: usize,
    node_gaps: usize,
}

impl LayerSpacing {
    fn fixed_height(&self, config: &SankeyConfig) -> f32 {
        self.group_gaps as f32 * config.node_group_y_spacing
            + self.non_empty_groups as f32 * config.node_group_y_padding * 2.0
            + self.node_gaps as f32 * config.node_y_spacing
    }

    fn padding_and_node_gaps(&self, config: &SankeyConfig) -> f32 {
        self.non_empty_groups as f32 * config.node_group_y_padding * 2.0
            + self.node_gaps as f32 * config.node_y_spacing
    }
}

/// Compute the full positioned tree and routed flow polygons for one
/// dataset. Pure: the dataset is never mutated, so repeated invocations
/// on the same input are idempotent and produce identical output.
pub fn compute_layout(
    dataset: &Dataset,
    theme: &Theme,
    config: &SankeyConfig,
) -> Result<SankeyLayout, LayoutError> {
    validate_flows(dataset)?;

    let available_width = config.available_width();
    let available_height = config.available_height();

    // Flow totals per layer/group/node, plus each node's last-seen
    // upstream and downstream neighbor (lookups by address, no embedded
    // references).
    let mut layer_totals: Vec<Totals> = vec![Totals::default(); dataset.layers.len()];
    let mut group_totals: Vec<Vec<Totals>> = dataset
        .layers
        .iter()
        .map(|layer| vec![Totals::default(); layer.groups.len()])
        .collect();
    let mut node_totals: BTreeMap<NodeAddress, Totals> = BTreeMap::new();
    let mut sources: BTreeMap<NodeAddress, NodeAddress> = BTreeMap::new();
    let mut targets: BTreeMap<NodeAddress, NodeAddress> = BTreeMap::new();

    for flow in &dataset.flows {
        for (hop, &addr) in flow.path.iter().enumerate() {
            // A single-waypoint flow still counts toward size_in so the
            // terminal node gets a visible size.
            if hop > 0 || flow.path.len() == 1 {
                layer_totals[addr.layer].size_in += flow.magnitude;
                group_totals[addr.layer][addr.group].size_in += flow.magnitude;
                node_totals.entry(addr).or_default().size_in += flow.magnitude;
            }
            if hop < flow.path.len() - 1 {
                layer_totals[addr.layer].size_out += flow.magnitude;
                group_totals[addr.layer][addr.group].size_out += flow.magnitude;
                node_totals.entry(addr).or_default().size_out += flow.magnitude;

                let next = flow.path[hop + 1];
                sources.insert(next, addr);
                targets.insert(addr, next);
            }
        }
    }

    let spacings: Vec<LayerSpacing> = dataset
        .layers
        .iter()
        .map(|layer| {
            let non_empty = layer
                .groups
                .iter()
                .filter(|group| !group.nodes.is_empty())
                .count();
            LayerSpacing {
                non_empty_groups: non_empty,
                group_gaps: non_empty.saturating_sub(1),
                node_gaps: layer
                    .groups
                    .iter()
                    .map(|group| group.nodes.len().saturating_sub(1))
                    .sum(),
            }
        })
        .collect();

    // Calibrate so the tightest layer exactly fills the available height;
    // zero-size layers would yield an infinite per-layer scale and are
    // excluded from the minimum.
    let y_scale = match config.manual_scale {
        Some(scale) => scale,
        None => {
            let mut min_scale: Option<f32> = None;
            for (idx, totals) in layer_totals.iter().enumerate() {
                if totals.size() <= 0.0 {
                    continue;
                }
                let scale = (available_height - spacings[idx].fixed_height(config)) / totals.size();
                min_scale = Some(match min_scale {
                    Some(current) => current.min(scale),
                    None => scale,
                });
            }
            match min_scale {
                Some(scale) if scale.is_finite() && scale > 0.0 => scale,
                _ => return Err(LayoutError::DegenerateScale),
            }
        }
    };

    let last_layer = dataset.layers.len().saturating_sub(1);
    let mut warnings: Vec<LayoutWarning> = Vec::new();
    let mut layers: Vec<LayerLayout> = Vec::with_capacity(dataset.layers.len());

    for (layer_idx, layer_spec) in dataset.layers.iter().enumerate() {
        let spacing = &spacings[layer_idx];
        let content_height = layer_totals[layer_idx].size() * y_scale;

        // Only spread redefines the per-layer group spacing; with fewer
        // than two non-empty groups there is no gap to inflate and the
        // base spacing stands.
        let group_spacing = match config.vertical_align {
            VerticalAlign::Spread if spacing.group_gaps > 0 => {
                (available_height - content_height - spacing.padding_and_node_gaps(config))
                    / spacing.group_gaps as f32
            }
            _ => config.node_group_y_spacing,
        };

        let total_height = match config.vertical_align {
            VerticalAlign::Spread if spacing.group_gaps > 0 => available_height,
            _ => content_height + spacing.fixed_height(config),
        };

        let layer_x = config.margins.left + layer_spec.x * (available_width - config.node_width);
        let mut y = config.margins.top
            + match config.vertical_align {
                VerticalAlign::Middle => 0.5 * (available_height - total_height),
                VerticalAlign::Top | VerticalAlign::Spread => 0.0,
                VerticalAlign::Bottom => available_height - total_height,
            };

        let layer_y = y;
        let mut groups: Vec<GroupLayout> = Vec::with_capacity(layer_spec.groups.len());

        for (group_idx, group_spec) in layer_spec.groups.iter().enumerate() {
            let totals = group_totals[layer_idx][group_idx];
            let group_y = y;

            let mut nodes: Vec<NodeLayout> = group_spec
                .nodes
                .iter()
                .enumerate()
                .map(|(node_idx, node_spec)| {
                    let address = NodeAddress::new(layer_idx, group_idx, node_idx);
                    let node_size = node_totals.get(&address).copied().unwrap_or_default();
                    let color = resolve_node_color(
                        address,
                        node_spec.color.as_deref(),
                        theme,
                        &mut warnings,
                    );
                    NodeLayout {
                        address,
                        title: node_spec.title.clone(),
                        x: layer_x,
                        y: 0.0,
                        width: config.node_width,
                        height: 0.0,
                        size: node_size.size(),
                        size_in: node_size.size_in,
                        size_out: node_size.size_out,
                        color,
                    }
                })
                .collect();

            // Empty groups occupy a zero-height slot: no padding, no
            // spacing contribution.
            if nodes.is_empty() {
                groups.push(GroupLayout {
                    key: NodeAddress::new(layer_idx, group_idx, 0).group_key(),
                    title: group_spec.title.clone(),
                    label_direction: group_spec.label_direction,
                    x: layer_x,
                    y: group_y,
                    height: 0.0,
                    inner_y: group_y,
                    inner_height: 0.0,
                    size: totals.size(),
                    size_in: totals.size_in,
                    size_out: totals.size_out,
                    label_x: 0.0,
                    label_y: 0.0,
                    label_anchor: LabelAnchor::Start,
                    nodes,
                });
                continue;
            }

            y += config.node_group_y_padding;

            // Nodes are stacked by downstream group so flow bundles stay
            // untangled; declaration index breaks ties and nodes without
            // a downstream neighbor keep their declared position.
            let mut order: Vec<usize> = (0..nodes.len()).collect();
            order.sort_by(|&a, &b| {
                let ta = targets.get(&nodes[a].address);
                let tb = targets.get(&nodes[b].address);
                match (ta, tb) {
                    (Some(ta), Some(tb)) => ta
                        .group
                        .cmp(&tb.group)
                        .then_with(|| nodes[a].address.node.cmp(&nodes[b].address.node)),
                    _ => Ordering::Equal,
                }
            });

            for &node_idx in &order {
                let node = &mut nodes[node_idx];
                node.y = y;
                node.height = node.size * y_scale;
                y += node.height + config.node_y_spacing;

                if node.address.layer != 0 && !sources.contains_key(&node.address) {
                    warnings.push(LayoutWarning::MissingInbound {
                        address: node.address,
                    });
                }
                if node.address.layer != last_layer && !targets.contains_key(&node.address) {
                    warnings.push(LayoutWarning::MissingOutbound {
                        address: node.address,
                    });
                }
            }

            y -= config.node_y_spacing;
            y += config.node_group_y_padding;

            let height = y - group_y;
            let direction = group_spec.label_direction;
            let label_x = layer_x
                + 0.5 * config.node_width
                + direction as f32 * (0.5 * config.node_width + config.group_label_distance);
            groups.push(GroupLayout {
                key: NodeAddress::new(layer_idx, group_idx, 0).group_key(),
                title: group_spec.title.clone(),
                label_direction: direction,
                x: layer_x,
                y: group_y,
                height,
                inner_y: group_y + config.node_group_y_padding,
                inner_height: height - 2.0 * config.node_group_y_padding,
                size: totals.size(),
                size_in: totals.size_in,
                size_out: totals.size_out,
                label_x,
                label_y: group_y + 0.5 * height,
                label_anchor: if direction < 0 {
                    LabelAnchor::End
                } else {
                    LabelAnchor::Start
                },
                nodes,
            });

            y += group_spacing;
        }

        layers.push(LayerLayout {
            index: layer_idx,
            title: layer_spec.title.clone(),
            x_fraction: layer_spec.x,
            x: layer_x,
            y: layer_y,
            total_height,
            size: layer_totals[layer_idx].size(),
            size_in: layer_totals[layer_idx].size_in,
            size_out: layer_totals[layer_idx].size_out,
            label_x: layer_x + 0.5 * config.node_width,
            label_y: 0.5 * config.margins.top,
            groups,
        });
    }

    let flows = routing::route_flows(&layers, &dataset.flows, y_scale, config);

    Ok(SankeyLayout {
        width: config.width,
        height: config.height,
        y_scale,
        layers,
        flows,
        warnings,
    })
}

fn validate_flows(dataset: &Dataset) -> Result<(), LayoutError> {
    for (flow_idx, flow) in dataset.flows.iter().enumerate() {
        if flow.path.is_empty() {
            return Err(LayoutError::EmptyFlowPath { flow: flow_idx });
        }
        if !(flow.magnitude.is_finite() && flow.magnitude > 0.0) {
            return Err(LayoutError::InvalidMagnitude {
                flow: flow_idx,
                magnitude: flow.magnitude,
            });
        }
        for (hop, &addr) in flow.path.iter().enumerate() {
            if dataset.node(addr).is_none() {
                return Err(LayoutError::FlowReference {
                    flow: flow_idx,
                    hop,
                    address: addr,
                });
            }
        }
    }
    Ok(())
}

fn resolve_node_color(
    address: NodeAddress,
    value: Option<&str>,
    theme: &Theme,
    warnings: &mut Vec<LayoutWarning>,
) -> Color {
    let fallback = || {
        Color::parse(&theme.default_node_color)
            .or_else(|| Color::parse(crate::theme::DEFAULT_NODE_COLOR))
            .unwrap_or(Color {
                h: 0.0,
                s: 0.0,
                l: 0.667,
            })
    };
    match value {
        None => fallback(),
        Some(raw) if raw.is_empty() => fallback(),
        Some(raw) => match Color::parse(raw) {
            Some(color) => color,
            None => {
                warnings.push(LayoutWarning::InvalidColor {
                    address,
                    value: raw.to_string(),
                });
                fallback()
            }
        },
    }
}

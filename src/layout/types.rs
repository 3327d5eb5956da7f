use crate::ir::{GroupKey, NodeAddress};
use crate::theme::Color;
use serde::Serialize;

use super::error::LayoutWarning;

/// Label anchoring side, matching SVG `text-anchor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelAnchor {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeLayout {
    pub address: NodeAddress,
    pub title: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// max(size_in, size_out); what the node's height encodes.
    pub size: f32,
    pub size_in: f32,
    pub size_out: f32,
    pub color: Color,
}

impl NodeLayout {
    /// Class token render adapters attach to the node shape,
    /// e.g. `node-0-1-2`.
    pub fn css_class(&self) -> String {
        format!("node-{}", self.address)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupLayout {
    pub key: GroupKey,
    pub title: Option<String>,
    /// -1 label left, 1 label right, 0 no label.
    pub label_direction: i8,
    pub x: f32,
    pub y: f32,
    pub height: f32,
    /// Top of the node block, below the group padding.
    pub inner_y: f32,
    /// Height of the node block, excluding padding.
    pub inner_height: f32,
    pub size: f32,
    pub size_in: f32,
    pub size_out: f32,
    pub label_x: f32,
    pub label_y: f32,
    pub label_anchor: LabelAnchor,
    pub nodes: Vec<NodeLayout>,
}

impl GroupLayout {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerLayout {
    pub index: usize,
    pub title: String,
    /// Caller-supplied horizontal fraction, echoed back.
    pub x_fraction: f32,
    pub x: f32,
    pub y: f32,
    pub total_height: f32,
    pub size: f32,
    pub size_in: f32,
    pub size_out: f32,
    pub label_x: f32,
    pub label_y: f32,
    pub groups: Vec<GroupLayout>,
}

/// One corner pair of a routed flow polygon: x position with the band's
/// top and bottom y. Four of these per segment; render with a smoothing
/// interpolation for the S-curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlowPoint {
    pub x: f32,
    pub y0: f32,
    pub y1: f32,
}

/// One routed hop of a flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowSegment {
    pub from: NodeAddress,
    pub to: NodeAddress,
    pub magnitude: f32,
    /// Band height in pixels, `magnitude * y_scale` on both ends.
    pub height: f32,
    /// Every address the full original path touches, for selection
    /// filtering ("highlight all flows through any node on this path").
    pub passes: Vec<NodeAddress>,
    pub points: [FlowPoint; 4],
}

impl FlowSegment {
    pub fn passes_through(&self, addr: NodeAddress) -> bool {
        self.passes.contains(&addr)
    }

    pub fn passes_through_group(&self, key: GroupKey) -> bool {
        self.passes.iter().any(|addr| key.contains(*addr))
    }

    /// Class string render adapters attach to the flow path, e.g.
    /// `flow passes-0-0-0 passes-1-0-0 from-0-0-0 to-1-0-0`.
    pub fn css_class(&self) -> String {
        let mut out = String::from("flow");
        for addr in &self.passes {
            out.push_str(&format!(" passes-{addr}"));
        }
        out.push_str(&format!(" from-{} to-{}", self.from, self.to));
        out
    }
}

/// The fully positioned diagram: one layer tree plus the routed flow
/// polygons, all in absolute pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyLayout {
    pub width: f32,
    pub height: f32,
    /// Pixels per unit of flow magnitude.
    pub y_scale: f32,
    pub layers: Vec<LayerLayout>,
    pub flows: Vec<FlowSegment>,
    pub warnings: Vec<LayoutWarning>,
}

impl SankeyLayout {
    pub fn node(&self, addr: NodeAddress) -> Option<&NodeLayout> {
        self.layers
            .get(addr.layer)?
            .groups
            .get(addr.group)?
            .nodes
            .get(addr.node)
    }

    pub fn group(&self, key: GroupKey) -> Option<&GroupLayout> {
        self.layers.get(key.layer)?.groups.get(key.group)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeLayout> {
        self.layers
            .iter()
            .flat_map(|layer| layer.groups.iter())
            .flat_map(|group| group.nodes.iter())
    }
}

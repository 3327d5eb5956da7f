//! Selection state machine driving fade/highlight appearance for one
//! chart instance. Owns no geometry: it reads the positioned layout and
//! maintains an appearance model a render adapter applies to its shapes.

use std::collections::BTreeMap;

use crate::ir::{GroupKey, NodeAddress};
use crate::layout::{GroupLayout, NodeLayout, SankeyLayout};
use crate::theme::{Color, Theme};

/// Visual state of one routed flow segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlowAppearance {
    Neutral,
    Faded,
    /// Filled with the origin node's color at highlight opacity.
    Highlighted { color: Color },
}

/// Visual state of one node rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeAppearance {
    Normal,
    Brightened,
    Faded,
}

/// Partial-height cover rectangle visualizing a sub-quantity within a
/// group's inner band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortionOverlay {
    pub y: f32,
    pub height: f32,
}

/// What the render adapter reads after each interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Appearance {
    /// Parallel to `SankeyLayout::flows`.
    pub flows: Vec<FlowAppearance>,
    nodes: BTreeMap<NodeAddress, NodeAppearance>,
    portions: BTreeMap<GroupKey, PortionOverlay>,
}

impl Appearance {
    pub fn node(&self, addr: NodeAddress) -> NodeAppearance {
        self.nodes
            .get(&addr)
            .copied()
            .unwrap_or(NodeAppearance::Normal)
    }

    pub fn portion(&self, key: GroupKey) -> Option<PortionOverlay> {
        self.portions.get(&key).copied()
    }

    pub fn portions(&self) -> impl Iterator<Item = (GroupKey, PortionOverlay)> + '_ {
        self.portions.iter().map(|(key, overlay)| (*key, *overlay))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    NodeActive(NodeAddress),
    GroupActive(GroupKey),
}

type NodeCallback<'a> = Box<dyn FnMut(&NodeLayout) + 'a>;
type GroupCallback<'a> = Box<dyn FnMut(&GroupLayout) + 'a>;

#[derive(Default)]
struct Callbacks<'a> {
    on_node_selected: Option<NodeCallback<'a>>,
    on_node_deselected: Option<NodeCallback<'a>>,
    on_group_selected: Option<GroupCallback<'a>>,
    on_group_deselected: Option<GroupCallback<'a>>,
}

/// One chart instance's interaction state. Layout stays immutable and
/// shareable; the selection is instance-exclusive. Callbacks run
/// synchronously during the call that triggers the transition and, since
/// every operation takes `&mut self`, cannot re-enter the machine.
pub struct Selection<'a> {
    layout: &'a SankeyLayout,
    theme: Theme,
    appearance: Appearance,
    state: SelectionState,
    callbacks: Callbacks<'a>,
}

impl<'a> Selection<'a> {
    pub fn new(layout: &'a SankeyLayout, theme: &Theme) -> Self {
        Self {
            layout,
            theme: theme.clone(),
            appearance: Appearance {
                flows: vec![FlowAppearance::Neutral; layout.flows.len()],
                ..Appearance::default()
            },
            state: SelectionState::Idle,
            callbacks: Callbacks::default(),
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn appearance(&self) -> &Appearance {
        &self.appearance
    }

    pub fn on_node_selected(&mut self, callback: impl FnMut(&NodeLayout) + 'a) {
        self.callbacks.on_node_selected = Some(Box::new(callback));
    }

    pub fn on_node_deselected(&mut self, callback: impl FnMut(&NodeLayout) + 'a) {
        self.callbacks.on_node_deselected = Some(Box::new(callback));
    }

    pub fn on_group_selected(&mut self, callback: impl FnMut(&GroupLayout) + 'a) {
        self.callbacks.on_group_selected = Some(Box::new(callback));
    }

    pub fn on_group_deselected(&mut self, callback: impl FnMut(&GroupLayout) + 'a) {
        self.callbacks.on_group_deselected = Some(Box::new(callback));
    }

    /// Toggle node selection: fade everything, highlight the flows
    /// passing through the node. Activating the active node again
    /// returns to idle. Unknown addresses are ignored.
    pub fn activate_node(&mut self, addr: NodeAddress) {
        let layout = self.layout;
        let Some(node) = layout.node(addr) else {
            return;
        };

        match self.state {
            SelectionState::NodeActive(old) => {
                if let Some(old_node) = layout.node(old) {
                    if let Some(callback) = self.callbacks.on_node_deselected.as_mut() {
                        callback(old_node);
                    }
                }
                self.set_flows_passing(old, FlowAppearance::Neutral);
                if old == addr {
                    self.state = SelectionState::Idle;
                    return;
                }
            }
            SelectionState::GroupActive(old_key) => {
                // A node activation displaces the active group.
                if let Some(old_group) = layout.group(old_key) {
                    if let Some(callback) = self.callbacks.on_group_deselected.as_mut() {
                        callback(old_group);
                    }
                }
            }
            SelectionState::Idle => {}
        }

        self.fade_all_flows();
        self.highlight_flows_passing(addr);
        self.appearance.nodes.remove(&addr);
        self.state = SelectionState::NodeActive(addr);
        if let Some(callback) = self.callbacks.on_node_selected.as_mut() {
            callback(node);
        }
    }

    /// Toggle group selection: highlight every flow passing through any
    /// node of the group. Resets node and portion highlighting first.
    pub fn activate_group(&mut self, key: GroupKey) {
        let layout = self.layout;
        let Some(group) = layout.group(key) else {
            return;
        };
        self.appearance.nodes.clear();
        self.appearance.portions.clear();

        match self.state {
            SelectionState::GroupActive(current) if current == key => {
                self.reset_all_flows();
                self.state = SelectionState::Idle;
                if let Some(callback) = self.callbacks.on_group_deselected.as_mut() {
                    callback(group);
                }
            }
            state => {
                if let SelectionState::NodeActive(old) = state {
                    // A group activation displaces the active node.
                    if let Some(old_node) = layout.node(old) {
                        if let Some(callback) = self.callbacks.on_node_deselected.as_mut() {
                            callback(old_node);
                        }
                    }
                }
                self.fade_all_flows();
                self.highlight_flows_in_group(key);
                self.state = SelectionState::GroupActive(key);
                if let Some(callback) = self.callbacks.on_group_selected.as_mut() {
                    callback(group);
                }
            }
        }
    }

    /// Transient hover highlight: brightens the group's nodes unless
    /// that same group is the committed selection.
    pub fn mouseover_group(&mut self, key: GroupKey) {
        if self.state == SelectionState::GroupActive(key) {
            return;
        }
        let Some(group) = self.layout.group(key) else {
            return;
        };
        let addresses: Vec<NodeAddress> = group.nodes.iter().map(|node| node.address).collect();
        for address in addresses {
            self.appearance
                .nodes
                .insert(address, NodeAppearance::Brightened);
        }
    }

    /// Reverses [`Selection::mouseover_group`].
    pub fn mouseout_group(&mut self, key: GroupKey) {
        if self.state == SelectionState::GroupActive(key) {
            return;
        }
        let Some(group) = self.layout.group(key) else {
            return;
        };
        for node in &group.nodes {
            self.appearance.nodes.remove(&node.address);
        }
    }

    /// Fade every node not in `keep`. Side effect only, no transition.
    pub fn fade_all_nodes_except(&mut self, keep: &[NodeAddress]) {
        for node in self.layout.nodes() {
            if keep.contains(&node.address) {
                self.appearance.nodes.remove(&node.address);
            } else {
                self.appearance
                    .nodes
                    .insert(node.address, NodeAppearance::Faded);
            }
        }
    }

    /// Highlight flow segments by index, bypassing click-driven
    /// activation (externally driven multi-select). Out-of-range
    /// indices are ignored.
    pub fn highlight_flows_by_ids(&mut self, ids: &[usize]) {
        for &id in ids {
            if id >= self.appearance.flows.len() {
                continue;
            }
            let color = self.origin_color(id);
            self.appearance.flows[id] = FlowAppearance::Highlighted { color };
        }
    }

    /// Cover `count` units of the group's inner band with an overlay
    /// rectangle, clamped to the band. Side effect only.
    pub fn highlight_portion(&mut self, key: GroupKey, count: f32) {
        let Some(group) = self.layout.group(key) else {
            return;
        };
        let height = (count * self.layout.y_scale).clamp(0.0, group.inner_height.max(0.0));
        self.appearance.portions.insert(
            key,
            PortionOverlay {
                y: group.inner_y,
                height,
            },
        );
    }

    pub fn reset_portion(&mut self, key: GroupKey) {
        self.appearance.portions.remove(&key);
    }

    /// Return every node, flow and portion to neutral appearance. Side
    /// effect only: the committed selection state is untouched.
    pub fn reset_all(&mut self) {
        self.appearance.nodes.clear();
        self.appearance.portions.clear();
        self.reset_all_flows();
    }

    pub fn fade_all_flows(&mut self) {
        self.appearance.flows.fill(FlowAppearance::Faded);
    }

    pub fn highlight_all_flows(&mut self) {
        for idx in 0..self.appearance.flows.len() {
            let color = self.origin_color(idx);
            self.appearance.flows[idx] = FlowAppearance::Highlighted { color };
        }
    }

    pub fn reset_all_flows(&mut self) {
        self.appearance.flows.fill(FlowAppearance::Neutral);
    }

    /// Opacity the render adapter should use for a flow in the given
    /// appearance, per the theme.
    pub fn flow_opacity(&self, appearance: FlowAppearance) -> Option<f32> {
        match appearance {
            FlowAppearance::Neutral => None,
            FlowAppearance::Faded => Some(self.theme.flow_fade_opacity),
            FlowAppearance::Highlighted { .. } => Some(self.theme.flow_highlight_opacity),
        }
    }

    /// Fill a render adapter should use for a node in the given
    /// appearance.
    pub fn node_fill(&self, node: &NodeLayout, appearance: NodeAppearance) -> Color {
        match appearance {
            NodeAppearance::Normal | NodeAppearance::Faded => node.color,
            NodeAppearance::Brightened => node.color.brighter(self.theme.hover_brighten),
        }
    }

    fn origin_color(&self, segment_idx: usize) -> Color {
        let segment = &self.layout.flows[segment_idx];
        self.layout
            .node(segment.from)
            .map(|node| node.color)
            .unwrap_or(Color {
                h: 0.0,
                s: 0.0,
                l: 0.667,
            })
    }

    fn set_flows_passing(&mut self, addr: NodeAddress, appearance: FlowAppearance) {
        for (idx, segment) in self.layout.flows.iter().enumerate() {
            if segment.passes_through(addr) {
                self.appearance.flows[idx] = appearance;
            }
        }
    }

    fn highlight_flows_passing(&mut self, addr: NodeAddress) {
        for idx in 0..self.layout.flows.len() {
            if self.layout.flows[idx].passes_through(addr) {
                let color = self.origin_color(idx);
                self.appearance.flows[idx] = FlowAppearance::Highlighted { color };
            }
        }
    }

    fn highlight_flows_in_group(&mut self, key: GroupKey) {
        for idx in 0..self.layout.flows.len() {
            if self.layout.flows[idx].passes_through_group(key) {
                let color = self.origin_color(idx);
                self.appearance.flows[idx] = FlowAppearance::Highlighted { color };
            }
        }
    }
}

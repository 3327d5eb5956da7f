use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of a node inside the dataset: (layer, group, node) indices.
///
/// Serialized as a plain `[layer, group, node]` triple to match the
/// dataset wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "[usize; 3]", into = "[usize; 3]")]
pub struct NodeAddress {
    pub layer: usize,
    pub group: usize,
    pub node: usize,
}

impl NodeAddress {
    pub fn new(layer: usize, group: usize, node: usize) -> Self {
        Self { layer, group, node }
    }

    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            layer: self.layer,
            group: self.group,
        }
    }
}

impl From<[usize; 3]> for NodeAddress {
    fn from(raw: [usize; 3]) -> Self {
        Self::new(raw[0], raw[1], raw[2])
    }
}

impl From<NodeAddress> for [usize; 3] {
    fn from(addr: NodeAddress) -> Self {
        [addr.layer, addr.group, addr.node]
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.layer, self.group, self.node)
    }
}

/// Address of a group: (layer, group) indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct GroupKey {
    pub layer: usize,
    pub group: usize,
}

impl GroupKey {
    pub fn new(layer: usize, group: usize) -> Self {
        Self { layer, group }
    }

    pub fn contains(&self, addr: NodeAddress) -> bool {
        self.layer == addr.layer && self.group == addr.group
    }
}

impl From<[usize; 2]> for GroupKey {
    fn from(raw: [usize; 2]) -> Self {
        Self::new(raw[0], raw[1])
    }
}

impl From<GroupKey> for [usize; 2] {
    fn from(key: GroupKey) -> Self {
        [key.layer, key.group]
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.layer, self.group)
    }
}

/// One column of the diagram. Layer order in the dataset is the
/// left-to-right order; `x` is the caller-supplied horizontal fraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSpec {
    #[serde(default)]
    pub title: String,
    /// Horizontal position fraction in 0..1.
    pub x: f32,
    pub groups: Vec<GroupSpec>,
}

/// A labeled cluster of nodes within one layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSpec {
    #[serde(default)]
    pub title: Option<String>,
    /// -1 = label left of the group, 1 = right, 0 = no label line.
    #[serde(default, rename = "labelDirection")]
    pub label_direction: i8,
    pub nodes: Vec<NodeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(default)]
    pub title: String,
    /// CSS color string; invalid or absent values fall back to neutral gray.
    #[serde(default)]
    pub color: Option<String>,
}

/// A quantity flowing through an ordered sequence of node addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSpec {
    pub magnitude: f32,
    pub path: Vec<NodeAddress>,
}

/// The full input dataset: layer/group/node hierarchy plus flows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub layers: Vec<LayerSpec>,
    pub flows: Vec<FlowSpec>,
}

impl Dataset {
    pub fn node(&self, addr: NodeAddress) -> Option<&NodeSpec> {
        self.layers
            .get(addr.layer)?
            .groups
            .get(addr.group)?
            .nodes
            .get(addr.node)
    }
}

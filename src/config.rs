use serde::{Deserialize, Serialize};
use std::path::Path;

/// Vertical placement of each layer's content block within the drawing area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Top,
    Middle,
    Bottom,
    /// Consume the entire available height by inflating inter-group spacing.
    Spread,
}

impl Default for VerticalAlign {
    fn default() -> Self {
        Self::Middle
    }
}

/// Space reserved around the diagram for layer and group labels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 50.0,
            left: 30.0,
            right: 30.0,
            bottom: 0.0,
        }
    }
}

/// Compass direction a tooltip widget should open towards. The crate does
/// not draw tooltips; the value is passed through for render adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TooltipDirection {
    N,
    E,
    S,
    W,
}

impl Default for TooltipDirection {
    fn default() -> Self {
        Self::E
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SankeyConfig {
    /// Total width including label margins.
    pub width: f32,
    /// Total height including label margins.
    pub height: f32,
    pub margins: Margins,
    pub node_width: f32,
    /// Vertical gap between nodes within a group.
    pub node_y_spacing: f32,
    /// Vertical gap between groups within a layer.
    pub node_group_y_spacing: f32,
    /// Vertical padding above and below a group's node block.
    pub node_group_y_padding: f32,
    pub vertical_align: VerticalAlign,
    /// When set, scale calibration is skipped and this pixels-per-unit
    /// value is used as-is.
    pub manual_scale: Option<f32>,
    /// Distance between a group and its label line.
    pub group_label_distance: f32,
    /// Flows travel horizontally for this distance before curving.
    pub flow_lead_width: f32,
    pub tooltip_direction: TooltipDirection,
}

impl Default for SankeyConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 500.0,
            margins: Margins::default(),
            node_width: 30.0,
            node_y_spacing: 3.0,
            node_group_y_spacing: 0.0,
            node_group_y_padding: 10.0,
            vertical_align: VerticalAlign::default(),
            manual_scale: None,
            group_label_distance: 5.0,
            flow_lead_width: 20.0,
            tooltip_direction: TooltipDirection::default(),
        }
    }
}

impl SankeyConfig {
    /// Drawing width left once label margins are subtracted.
    pub fn available_width(&self) -> f32 {
        self.width - self.margins.left - self.margins.right
    }

    /// Drawing height left once label margins are subtracted.
    pub fn available_height(&self) -> f32 {
        self.height - self.margins.top - self.margins.bottom
    }
}

/// Optional config file. Every field falls back to the built-in default,
/// so a partial file only overrides what it names. JSON5 is accepted so
/// hand-written files may carry comments and trailing commas.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<SankeyConfig> {
    let Some(path) = path else {
        return Ok(SankeyConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let config: SankeyConfig = json5::from_str(&contents)?;
    Ok(config)
}

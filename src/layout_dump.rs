use crate::ir::{GroupKey, NodeAddress};
use crate::layout::SankeyLayout;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Flat, render-adapter-friendly view of a computed layout.
#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub y_scale: f32,
    pub layers: Vec<LayerDump>,
    pub nodes: Vec<NodeDump>,
    pub flows: Vec<FlowDump>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LayerDump {
    pub index: usize,
    pub title: String,
    pub x: f32,
    pub y: f32,
    pub total_height: f32,
    pub label_x: f32,
    pub label_y: f32,
    pub groups: Vec<GroupDump>,
}

#[derive(Debug, Serialize)]
pub struct GroupDump {
    pub key: GroupKey,
    pub title: Option<String>,
    pub x: f32,
    pub y: f32,
    pub height: f32,
    pub inner_y: f32,
    pub inner_height: f32,
    pub size: f32,
    pub label_x: f32,
    pub label_y: f32,
    pub label_anchor: String,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub address: NodeAddress,
    pub class: String,
    pub title: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub size: f32,
    pub color: String,
}

#[derive(Debug, Serialize)]
pub struct FlowDump {
    pub from: NodeAddress,
    pub to: NodeAddress,
    pub class: String,
    pub height: f32,
    pub points: Vec<[f32; 3]>,
}

impl LayoutDump {
    pub fn from_layout(layout: &SankeyLayout) -> Self {
        let layers = layout
            .layers
            .iter()
            .map(|layer| LayerDump {
                index: layer.index,
                title: layer.title.clone(),
                x: layer.x,
                y: layer.y,
                total_height: layer.total_height,
                label_x: layer.label_x,
                label_y: layer.label_y,
                groups: layer
                    .groups
                    .iter()
                    .map(|group| GroupDump {
                        key: group.key,
                        title: group.title.clone(),
                        x: group.x,
                        y: group.y,
                        height: group.height,
                        inner_y: group.inner_y,
                        inner_height: group.inner_height,
                        size: group.size,
                        label_x: group.label_x,
                        label_y: group.label_y,
                        label_anchor: format!("{:?}", group.label_anchor).to_lowercase(),
                    })
                    .collect(),
            })
            .collect();

        let nodes = layout
            .nodes()
            .map(|node| NodeDump {
                address: node.address,
                class: node.css_class(),
                title: node.title.clone(),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                size: node.size,
                color: node.color.to_hex(),
            })
            .collect();

        let flows = layout
            .flows
            .iter()
            .map(|segment| FlowDump {
                from: segment.from,
                to: segment.to,
                class: segment.css_class(),
                height: segment.height,
                points: segment
                    .points
                    .iter()
                    .map(|point| [point.x, point.y0, point.y1])
                    .collect(),
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            y_scale: layout.y_scale,
            layers,
            nodes,
            flows,
            warnings: layout
                .warnings
                .iter()
                .map(|warning| warning.to_string())
                .collect(),
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &SankeyLayout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

use crate::canvas::paint::{bottom_label, top_label};
use crate::canvas::{Canvas, Component};
use crate::layout::{Point, Size};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Canvas geometry in canvas coordinates, for debugging layouts.
#[derive(Debug, Serialize)]
pub struct SceneDump {
    pub width: f32,
    pub height: f32,
    pub components: Vec<ComponentDump>,
}

#[derive(Debug, Serialize)]
pub struct ComponentDump {
    pub offset: Point,
    pub vertices: Vec<VertexDump>,
    pub lines: Vec<LineDump>,
    pub spacers: Vec<SpacerDump>,
}

#[derive(Debug, Serialize)]
pub struct VertexDump {
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub size: Size,
    pub radius: f32,
    pub text: Vec<String>,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct LineDump {
    pub origin: String,
    pub dest: String,
    pub relationships: Vec<String>,
    pub width: Option<f32>,
    pub arrow_start: bool,
    pub arrow_end: bool,
    pub top_label: String,
    pub bottom_label: String,
    pub points: Vec<[f32; 2]>,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct SpacerDump {
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl SceneDump {
    pub fn from_canvas(canvas: &Canvas) -> Self {
        let (width, height) = canvas
            .bounds()
            .map(|b| (b.width(), b.height()))
            .unwrap_or_default();
        SceneDump {
            width,
            height,
            components: canvas.components().iter().map(dump_component).collect(),
        }
    }
}

fn dump_component(component: &Component) -> ComponentDump {
    let offset = component.offset();
    let place = |p: Point| p.offset(offset.x, offset.y);

    let vertices = component
        .vertices()
        .iter()
        .map(|vertex| {
            let center = place(vertex.center());
            VertexDump {
                label: vertex.label().to_string(),
                x: center.x,
                y: center.y,
                size: vertex.size(),
                radius: vertex.radius(),
                text: vertex.text().to_vec(),
                selected: vertex.is_selected(),
            }
        })
        .collect();

    let lines = component
        .lines()
        .iter()
        .map(|line| {
            let (origin, dest) = component.ends(line);
            let points: Vec<[f32; 2]> = line
                .segment()
                .map(|(start, end)| {
                    [start, end]
                        .into_iter()
                        .map(|p| {
                            let p = place(p);
                            [p.x, p.y]
                        })
                        .collect()
                })
                .unwrap_or_default();
            LineDump {
                origin: origin.label().to_string(),
                dest: dest.label().to_string(),
                relationships: line.members().iter().map(ToString::to_string).collect(),
                width: line.width(),
                arrow_start: line.start_arrow(),
                arrow_end: line.end_arrow(),
                top_label: top_label(line, origin.label(), dest.label()),
                bottom_label: bottom_label(line),
                points,
                selected: line.is_selected(),
            }
        })
        .collect();

    let mut spacers: Vec<SpacerDump> = component
        .spacers()
        .map(|(label, spacer)| {
            let center = place(spacer.center);
            SpacerDump {
                label: label.to_string(),
                x: center.x,
                y: center.y,
                radius: spacer.radius,
            }
        })
        .collect();
    spacers.sort_by(|a, b| a.label.cmp(&b.label));

    ComponentDump {
        offset,
        vertices,
        lines,
        spacers,
    }
}

pub fn write_scene_dump(path: &Path, canvas: &Canvas) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = SceneDump::from_canvas(canvas);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters for the default force-directed placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceConfig {
    pub iterations: usize,
    pub step: f32,
    pub charge: f32,
    pub spring: f32,
    pub max_force: f32,
    pub node_speed: f32,
    pub damping: f32,
    pub mass: f32,
    /// Starting circle radius per node.
    pub initial_radius: f32,
    pub scale: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            iterations: 300,
            step: 0.035,
            charge: 150.0,
            spring: 0.05,
            max_force: 100.0,
            node_speed: 3000.0,
            damping: 0.9,
            mass: 10.0,
            initial_radius: 40.0,
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Characters per line before a vertex label wraps.
    pub wrap_width: usize,
    /// Gap between a vertex label and its box.
    pub vertex_padding: f32,
    pub label_line_height: f32,
    /// Free space kept around each packed component.
    pub component_spacing: f32,
    /// Distance between an edge and its labels.
    pub edge_label_offset: f32,
    /// Extra reach, in pixels, when clicking near a line.
    pub hit_tolerance: f32,
    /// Skip font loading and size text with the built-in width table.
    pub fast_text_metrics: bool,
    pub force: ForceConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            wrap_width: 8,
            vertex_padding: 10.0,
            label_line_height: 1.2,
            component_spacing: 20.0,
            edge_label_offset: 3.0,
            hit_tolerance: 4.0,
            fast_text_metrics: false,
            force: ForceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::sociogram_default();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    fill_color: Option<String>,
    stroke_color: Option<String>,
    text_color: Option<String>,
    line_color: Option<String>,
    edge_text_color: Option<String>,
    selection_color: Option<String>,
    selection_width: Option<f32>,
    background: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    wrap_width: Option<usize>,
    vertex_padding: Option<f32>,
    label_line_height: Option<f32>,
    component_spacing: Option<f32>,
    edge_label_offset: Option<f32>,
    hit_tolerance: Option<f32>,
    fast_text_metrics: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForceConfigFile {
    iterations: Option<usize>,
    step: Option<f32>,
    charge: Option<f32>,
    spring: Option<f32>,
    max_force: Option<f32>,
    node_speed: Option<f32>,
    damping: Option<f32>,
    mass: Option<f32>,
    initial_radius: Option<f32>,
    scale: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    force: Option<ForceConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Overlays a JSON config document onto the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "modern" {
            config.theme = Theme::modern();
        } else if theme_name == "default" || theme_name == "classic" {
            config.theme = Theme::sociogram_default();
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.vertex.font_family = v.clone();
            config.theme.edge.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.vertex.font_size = v;
            config.theme.edge.font_size = v;
        }
        if let Some(v) = vars.fill_color {
            config.theme.vertex.fill_color = v;
        }
        if let Some(v) = vars.stroke_color {
            config.theme.vertex.stroke_color = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.vertex.text_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.edge.stroke_color = v;
        }
        if let Some(v) = vars.edge_text_color {
            config.theme.edge.text_color = v;
        }
        if let Some(v) = vars.selection_color {
            config.theme.vertex.selection_color = v.clone();
            config.theme.edge.selection_color = v;
        }
        if let Some(v) = vars.selection_width {
            config.theme.vertex.selection_width = v;
            config.theme.edge.selection_width = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }
    config.render.background = config.theme.background.clone();

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.wrap_width {
            config.layout.wrap_width = v.max(1);
        }
        if let Some(v) = layout.vertex_padding {
            config.layout.vertex_padding = v;
        }
        if let Some(v) = layout.label_line_height {
            config.layout.label_line_height = v;
        }
        if let Some(v) = layout.component_spacing {
            config.layout.component_spacing = v.max(0.0);
        }
        if let Some(v) = layout.edge_label_offset {
            config.layout.edge_label_offset = v;
        }
        if let Some(v) = layout.hit_tolerance {
            config.layout.hit_tolerance = v.max(0.0);
        }
        if let Some(v) = layout.fast_text_metrics {
            config.layout.fast_text_metrics = v;
        }
    }

    if let Some(force) = parsed.force {
        let target = &mut config.layout.force;
        if let Some(v) = force.iterations {
            target.iterations = v;
        }
        if let Some(v) = force.step {
            target.step = v;
        }
        if let Some(v) = force.charge {
            target.charge = v;
        }
        if let Some(v) = force.spring {
            target.spring = v;
        }
        if let Some(v) = force.max_force {
            target.max_force = v;
        }
        if let Some(v) = force.node_speed {
            target.node_speed = v;
        }
        if let Some(v) = force.damping {
            target.damping = v;
        }
        if let Some(v) = force.mass {
            target.mass = v;
        }
        if let Some(v) = force.initial_radius {
            target.initial_radius = v;
        }
        if let Some(v) = force.scale {
            target.scale = v;
        }
    }

    Ok(config)
}

use serde::{Deserialize, Serialize};

/// Drawing properties shared by every vertex or every line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stylesheet {
    /// Vertex box background; unused for lines.
    pub fill_color: String,
    /// Vertex box outline, or the line itself.
    pub stroke_color: String,
    pub text_color: String,
    pub font_family: String,
    pub font_size: f32,
    /// Highlight ring (vertex) or highlight border (line).
    pub selection_color: String,
    pub selection_width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub vertex: Stylesheet,
    pub edge: Stylesheet,
    pub background: String,
}

impl Theme {
    pub fn sociogram_default() -> Self {
        let font_family = "\"DejaVu Sans\", verdana, arial, sans-serif".to_string();
        Self {
            vertex: Stylesheet {
                fill_color: "#FFFF00".to_string(),
                stroke_color: "#000000".to_string(),
                text_color: "#000000".to_string(),
                font_family: font_family.clone(),
                font_size: 12.0,
                selection_color: "#3465A4".to_string(),
                selection_width: 2.0,
            },
            edge: Stylesheet {
                fill_color: "none".to_string(),
                stroke_color: "#333333".to_string(),
                text_color: "#000000".to_string(),
                font_family,
                font_size: 10.0,
                selection_color: "#3465A4".to_string(),
                selection_width: 2.0,
            },
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        let font_family = "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string();
        Self {
            vertex: Stylesheet {
                fill_color: "#F8FAFF".to_string(),
                stroke_color: "#C7D2E5".to_string(),
                text_color: "#1C2430".to_string(),
                font_family: font_family.clone(),
                font_size: 13.0,
                selection_color: "#2F6FEB".to_string(),
                selection_width: 2.0,
            },
            edge: Stylesheet {
                fill_color: "none".to_string(),
                stroke_color: "#7A8AA6".to_string(),
                text_color: "#1C2430".to_string(),
                font_family,
                font_size: 11.0,
                selection_color: "#2F6FEB".to_string(),
                selection_width: 1.5,
            },
            background: "#FFFFFF".to_string(),
        }
    }
}

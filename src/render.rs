use crate::canvas::shape::text_top;
use crate::canvas::{Canvas, Group, Shape, TextStyle};
use crate::config::RenderConfig;
use crate::layout::{Bounds, Point};
use crate::theme::Theme;
use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

/// Margin around the drawing inside the view box.
const PADDING: f32 = 10.0;

pub fn render_svg(canvas: &Canvas, theme: &Theme) -> String {
    let bounds = canvas
        .bounds()
        .unwrap_or(Bounds::from_rect(0.0, 0.0, 0.0, 0.0));
    let x = bounds.min_x - PADDING;
    let y = bounds.min_y - PADDING;
    let width = bounds.width() + 2.0 * PADDING;
    let height = bounds.height() + 2.0 * PADDING;

    let mut svg = String::new();
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"{x:.2} {y:.2} {width:.2} {height:.2}\">",
    );
    let _ = write!(
        svg,
        "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        escape_xml(&theme.background)
    );

    let markers = arrow_colors(canvas);
    if !markers.is_empty() {
        svg.push_str("<defs>");
        for (idx, color) in markers.iter().enumerate() {
            let _ = write!(
                svg,
                "<marker id=\"arrow-{idx}\" markerUnits=\"userSpaceOnUse\" markerWidth=\"9\" markerHeight=\"7\" refX=\"9\" refY=\"3.5\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 9 3.5 L 0 7 z\" fill=\"{}\"/></marker>",
                escape_xml(color)
            );
        }
        svg.push_str("</defs>");
    }

    for component in canvas.components() {
        let offset = component.offset();
        let _ = write!(
            svg,
            "<g transform=\"translate({:.2} {:.2})\">",
            offset.x, offset.y
        );
        for vertex in component.vertices() {
            if let Some(highlight) = vertex.highlight() {
                push_shapes(&mut svg, highlight.shapes(), &markers);
            }
            push_group(&mut svg, vertex.group(), &markers);
        }
        for line in component.lines() {
            if let Some(highlight) = line.highlight() {
                push_shapes(&mut svg, highlight.shapes(), &markers);
            }
            push_group(&mut svg, line.group(), &markers);
        }
        svg.push_str("</g>");
    }

    svg.push_str("</svg>");
    svg
}

/// Distinct stroke colors of every arrowed line, in drawing order.
fn arrow_colors(canvas: &Canvas) -> Vec<String> {
    let mut colors: Vec<String> = Vec::new();
    for component in canvas.components() {
        for line in component.lines() {
            let highlight = line.highlight().map(|h| h.shapes()).unwrap_or_default();
            for shape in line.group().shapes().iter().chain(highlight) {
                if let Shape::Polyline {
                    stroke,
                    start_arrow,
                    end_arrow,
                    ..
                } = shape
                {
                    if (*start_arrow || *end_arrow) && !colors.contains(stroke) {
                        colors.push(stroke.clone());
                    }
                }
            }
        }
    }
    colors
}

fn push_group(svg: &mut String, group: &Group, markers: &[String]) {
    if group.is_empty() {
        return;
    }
    svg.push_str("<g>");
    push_shapes(svg, group.shapes(), markers);
    svg.push_str("</g>");
}

fn push_shapes(svg: &mut String, shapes: &[Shape], markers: &[String]) {
    for shape in shapes {
        push_shape(svg, shape, markers);
    }
}

fn push_shape(svg: &mut String, shape: &Shape, markers: &[String]) {
    match shape {
        Shape::Rect {
            bounds,
            fill,
            stroke,
            stroke_width,
        } => {
            let _ = write!(
                svg,
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{stroke_width}\"/>",
                bounds.min_x,
                bounds.min_y,
                bounds.width(),
                bounds.height(),
                escape_xml(fill),
                escape_xml(stroke)
            );
        }
        Shape::Circle {
            center,
            radius,
            fill,
            stroke,
            stroke_width,
        } => {
            let _ = write!(
                svg,
                "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{radius:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{stroke_width}\"/>",
                center.x,
                center.y,
                escape_xml(fill.as_deref().unwrap_or("none")),
                escape_xml(stroke.as_deref().unwrap_or("none"))
            );
        }
        Shape::Polyline {
            points,
            stroke,
            width,
            start_arrow,
            end_arrow,
        } => {
            let marker = markers
                .iter()
                .position(|color| color == stroke)
                .map(|idx| format!("url(#arrow-{idx})"));
            let _ = write!(
                svg,
                "<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{width:.2}\"",
                points_attr(points),
                escape_xml(stroke)
            );
            if let Some(marker) = &marker {
                if *start_arrow {
                    let _ = write!(svg, " marker-start=\"{marker}\"");
                }
                if *end_arrow {
                    let _ = write!(svg, " marker-end=\"{marker}\"");
                }
            }
            svg.push_str("/>");
        }
        Shape::Text {
            at,
            anchor,
            lines,
            size,
            rotation,
            style,
        } => {
            let top = text_top(*at, *anchor, size.height);
            push_text(svg, *at, top, lines, *rotation, style);
        }
    }
}

fn push_text(svg: &mut String, at: Point, top: f32, lines: &[String], rotation: f32, style: &TextStyle) {
    let _ = write!(
        svg,
        "<text text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\"",
        escape_xml(&style.font_family),
        style.font_size,
        escape_xml(&style.color)
    );
    if rotation != 0.0 {
        let _ = write!(
            svg,
            " transform=\"rotate({rotation:.2} {:.2} {:.2})\"",
            at.x, at.y
        );
    }
    svg.push('>');
    let advance = style.font_size * style.line_height;
    for (idx, line) in lines.iter().enumerate() {
        let baseline = top + style.font_size + advance * idx as f32;
        let _ = write!(
            svg,
            "<tspan x=\"{:.2}\" y=\"{baseline:.2}\">{}</tspan>",
            at.x,
            escape_xml(line)
        );
    }
    svg.push_str("</text>");
}

fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{:.2},{:.2}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "DejaVu Sans".to_string();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Painters, Selection};
    use crate::config::LayoutConfig;
    use crate::graph::Sociograph;
    use std::collections::HashMap;

    fn row(nodes: &[String], _edges: &[(String, String)]) -> HashMap<String, Point> {
        nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), Point::new(i as f32 * 150.0, 0.0)))
            .collect()
    }

    fn canvas(theme: &Theme) -> Canvas {
        let layout = LayoutConfig {
            fast_text_metrics: true,
            ..LayoutConfig::default()
        };
        let painters = Painters::standard(&theme.vertex, &theme.edge, &layout);
        Canvas::with_parts(layout, painters, row)
    }

    #[test]
    fn renders_vertices_lines_and_labels() {
        let theme = Theme::sociogram_default();
        let mut graph = Sociograph::new();
        graph.add_node("Ann & Co", []).unwrap();
        graph.add_node("Bob", []).unwrap();
        graph
            .add_relationship("likes", "Ann & Co", "Bob", 4, false, [])
            .unwrap();
        let mut canvas = canvas(&theme);
        canvas.redraw(&graph).unwrap();

        let svg = render_svg(&canvas, &theme);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<rect").count(), 3);
        assert!(svg.contains("Ann &amp; Co likes Bob"));
        assert!(svg.contains("marker-end=\"url(#arrow-0)\""));
        assert!(!svg.contains("marker-start"));
        assert!(svg.contains("<g transform=\"translate("));
    }

    #[test]
    fn selection_adds_highlight_and_marker() {
        let theme = Theme::sociogram_default();
        let mut graph = Sociograph::new();
        graph.add_node("A", []).unwrap();
        graph.add_node("B", []).unwrap();
        graph.add_relationship("trusts", "A", "B", 2, true, []).unwrap();
        let mut canvas = canvas(&theme);
        canvas.redraw(&graph).unwrap();

        let plain = render_svg(&canvas, &theme);
        assert!(plain.contains("Both trusts"));
        assert!(plain.contains("marker-start"));

        canvas
            .select(Selection::Line("A".to_string(), "B".to_string()))
            .unwrap();
        let selected = render_svg(&canvas, &theme);
        assert_eq!(selected.matches("<polyline").count(), 2);
        assert!(selected.contains("id=\"arrow-1\""));
        assert!(selected.contains(&theme.edge.selection_color));
    }

    #[test]
    fn empty_canvas_is_still_a_document() {
        let theme = Theme::modern();
        let svg = render_svg(&canvas(&theme), &theme);
        assert!(svg.contains("viewBox=\"-10.00 -10.00 20.00 20.00\""));
        assert!(!svg.contains("<defs>"));
    }

    #[test]
    fn multiline_text_gets_one_tspan_per_line() {
        let style = TextStyle {
            color: "#000".to_string(),
            font_family: "sans".to_string(),
            font_size: 10.0,
            line_height: 1.5,
        };
        let mut svg = String::new();
        let lines = vec!["one".to_string(), "two".to_string()];
        push_text(&mut svg, Point::new(5.0, 0.0), -15.0, &lines, 30.0, &style);
        assert!(svg.contains("rotate(30.00 5.00 0.00)"));
        assert!(svg.contains("<tspan x=\"5.00\" y=\"-5.00\">one</tspan>"));
        assert!(svg.contains("<tspan x=\"5.00\" y=\"10.00\">two</tspan>"));
    }
}

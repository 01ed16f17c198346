use crate::measure::TextMetrics;
use crate::model::RelationshipType;
use crate::render::{DrawCommand, EdgeLabel, EdgeLine, NodeBox, NodeVisual, Rect, Scene};
use std::fmt::{self, Write};

pub struct SvgRenderer {
    metrics: TextMetrics,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            metrics: TextMetrics::default(),
        }
    }
}

impl SvgRenderer {
    pub fn render(&self, scene: &Scene) -> String {
        let mut svg = String::new();
        // Writing into a String never fails.
        let _ = self.write_scene(&mut svg, scene);
        svg
    }

    fn write_scene(&self, svg: &mut String, scene: &Scene) -> fmt::Result {
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            scene.width, scene.height, scene.width, scene.height
        )?;

        writeln!(
            svg,
            r#"<style>
  .canvas-bg {{ fill: #f3f4f6; }}
  .entity-bg {{ fill: #fff; }}
  .entity-header {{ fill: #2563eb; }}
  .entity-border {{ fill: none; stroke: #d1d5db; stroke-width: 2; }}
  .selected .entity-border {{ stroke: #3b82f6; }}
  .connect-source .entity-bg {{ fill: #f0fdf4; }}
  .connect-source .entity-border {{ stroke: #22c55e; }}
  .entity-name {{ font-family: sans-serif; font-size: 14px; font-weight: bold; fill: #fff; }}
  .entity-desc {{ font-family: sans-serif; font-size: 11px; fill: #fff; opacity: 0.9; }}
  .column-text {{ font-family: monospace; font-size: 12px; fill: #374151; }}
  .column-type {{ font-family: monospace; font-size: 12px; fill: #6b7280; }}
  .pk {{ font-weight: bold; fill: #a16207; }}
  .edge {{ stroke-width: 2; fill: none; }}
  .edge-label {{ font-family: sans-serif; font-size: 10px; fill: #6b7280; cursor: pointer; }}
  .drag-ghost {{ fill: none; stroke: #3b82f6; stroke-width: 1.5; stroke-dasharray: 6 4; }}
  .banner-bg {{ fill: #dcfce7; stroke: #86efac; }}
  .banner-text {{ font-family: sans-serif; font-size: 12px; fill: #166534; }}
</style>"#
        )?;

        writeln!(
            svg,
            r##"<defs>
  <pattern id="dots" width="20" height="20" patternUnits="userSpaceOnUse"><circle cx="1" cy="1" r="1" fill="#94a3b8" opacity="0.2" /></pattern>
  <marker id="arrow-blue" markerWidth="10" markerHeight="7" refX="9" refY="3.5" orient="auto"><polygon points="0 0, 10 3.5, 0 7" fill="#3b82f6" /></marker>
  <marker id="arrow-green" markerWidth="10" markerHeight="7" refX="9" refY="3.5" orient="auto"><polygon points="0 0, 10 3.5, 0 7" fill="#10b981" /></marker>
</defs>"##
        )?;

        writeln!(
            svg,
            r#"<rect class="canvas-bg" x="0" y="0" width="{}" height="{}" />"#,
            scene.width, scene.height
        )?;
        writeln!(
            svg,
            r#"<rect x="0" y="0" width="{}" height="{}" fill="url(#dots)" />"#,
            scene.width, scene.height
        )?;

        for command in &scene.commands {
            match command {
                DrawCommand::Edge(edge) => self.write_edge(svg, edge)?,
                DrawCommand::EdgeLabel(label) => self.write_label(svg, label)?,
                DrawCommand::Node(node) => self.write_node(svg, node)?,
                DrawCommand::DragGhost { table_name, rect } => {
                    self.write_ghost(svg, table_name, rect)?
                }
                DrawCommand::Banner { lines } => self.write_banner(svg, lines)?,
            }
        }

        writeln!(svg, "</svg>")
    }

    fn write_edge(&self, svg: &mut String, edge: &EdgeLine) -> fmt::Result {
        let marker = match edge.relationship_type {
            RelationshipType::OneToMany => "arrow-blue",
            _ => "arrow-green",
        };
        writeln!(
            svg,
            r#"<line class="edge" x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" marker-end="url(#{})" />"#,
            edge.from.x, edge.from.y, edge.to.x, edge.to.y, edge.stroke, marker
        )
    }

    fn write_label(&self, svg: &mut String, label: &EdgeLabel) -> fmt::Result {
        writeln!(
            svg,
            r#"<text class="edge-label" x="{}" y="{}" text-anchor="middle" data-relationship-id="{}"><title>Click to delete relationship</title>{}</text>"#,
            label.at.x,
            label.at.y,
            escape_xml(&label.relationship_id),
            escape_xml(&label.text)
        )
    }

    fn write_node(&self, svg: &mut String, node: &NodeBox) -> fmt::Result {
        let Rect { x, y, width: w, height: h } = node.rect;
        let header_h = node.header_height;

        let class = match node.visual {
            NodeVisual::Normal => "entity",
            NodeVisual::Selected => "entity selected",
            NodeVisual::ConnectSource => "entity connect-source",
        };
        writeln!(
            svg,
            r#"<g class="{}" data-table="{}">"#,
            class,
            escape_xml(&node.table_name)
        )?;

        // 1. Background
        writeln!(
            svg,
            r#"<rect class="entity-bg" x="{}" y="{}" width="{}" height="{}" rx="8" />"#,
            x, y, w, h
        )?;

        // 2. Header, square bottom corners when columns follow
        if node.rows.is_empty() {
            writeln!(
                svg,
                r#"<rect class="entity-header" x="{}" y="{}" width="{}" height="{}" rx="8" />"#,
                x, y, w, h
            )?;
        } else {
            writeln!(
                svg,
                r#"<rect class="entity-header" x="{}" y="{}" width="{}" height="{}" rx="8" />"#,
                x, y, w, header_h
            )?;
            writeln!(
                svg,
                r#"<rect class="entity-header" x="{}" y="{}" width="{}" height="{}" />"#,
                x,
                y + header_h - 8.0,
                w,
                8.0
            )?;
        }

        // 3. Name and description
        let name_y = y + self.metrics.header_padding + self.metrics.line_height * 0.75;
        writeln!(
            svg,
            r#"<text class="entity-name" x="{}" y="{}">{}</text>"#,
            x + self.metrics.padding_x,
            name_y,
            escape_xml(&node.table_name)
        )?;
        if let Some(description) = &node.description {
            writeln!(
                svg,
                r#"<text class="entity-desc" x="{}" y="{}">{}</text>"#,
                x + self.metrics.padding_x,
                name_y + self.metrics.line_height,
                escape_xml(description)
            )?;
        }

        // 4. Column rows
        let mut row_y = y + header_h + self.metrics.padding_y + self.metrics.line_height * 0.7;
        for row in &node.rows {
            let class = if row.primary_key {
                "column-text pk"
            } else {
                "column-text"
            };
            writeln!(
                svg,
                r#"<text class="{}" x="{}" y="{}">{}</text>"#,
                class,
                x + self.metrics.padding_x,
                row_y,
                escape_xml(&row.name)
            )?;
            writeln!(
                svg,
                r#"<text class="column-type" x="{}" y="{}" text-anchor="end">{}</text>"#,
                x + w - self.metrics.padding_x,
                row_y,
                escape_xml(&row.detail)
            )?;
            row_y += self.metrics.line_height;
        }

        // 5. Border on top
        writeln!(
            svg,
            r#"<rect class="entity-border" x="{}" y="{}" width="{}" height="{}" rx="8" />"#,
            x, y, w, h
        )?;

        writeln!(svg, "</g>")
    }

    fn write_ghost(&self, svg: &mut String, table_name: &str, rect: &Rect) -> fmt::Result {
        writeln!(
            svg,
            r#"<rect class="drag-ghost" x="{}" y="{}" width="{}" height="{}" rx="8" />"#,
            rect.x, rect.y, rect.width, rect.height
        )?;
        writeln!(
            svg,
            r#"<text class="column-text" x="{}" y="{}">{}</text>"#,
            rect.x + self.metrics.padding_x,
            rect.y + self.metrics.line_height,
            escape_xml(table_name)
        )
    }

    fn write_banner(&self, svg: &mut String, lines: &[String]) -> fmt::Result {
        let width = lines
            .iter()
            .map(|l| self.metrics.label_size(l).0 * 1.2)
            .fold(0.0, f64::max)
            + self.metrics.padding_x * 2.0;
        let height = lines.len() as f64 * self.metrics.line_height + self.metrics.padding_y * 2.0;
        writeln!(
            svg,
            r#"<rect class="banner-bg" x="16" y="16" width="{}" height="{}" rx="8" />"#,
            width, height
        )?;
        let mut line_y = 16.0 + self.metrics.padding_y + self.metrics.line_height * 0.75;
        for line in lines {
            writeln!(
                svg,
                r#"<text class="banner-text" x="{}" y="{}">{}</text>"#,
                16.0 + self.metrics.padding_x,
                line_y,
                escape_xml(line)
            )?;
            line_y += self.metrics.line_height;
        }
        Ok(())
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditorState;
    use crate::gesture::GestureState;
    use crate::layout::LayoutModel;
    use crate::model::{Column, Relationship, TableNode};
    use crate::render::CanvasRenderer;

    fn render(state: &EditorState) -> String {
        let scene = CanvasRenderer::default().render(state);
        SvgRenderer::default().render(&scene)
    }

    fn state() -> EditorState {
        EditorState::new(LayoutModel::from_parts(
            vec![
                TableNode::new("User")
                    .with_column(Column::new("id", "int").pk())
                    .with_column(Column::new("name", "string"))
                    .at(0.0, 0.0),
                TableNode::new("Order")
                    .with_column(Column::new("id", "int").pk())
                    .at(300.0, 0.0),
            ],
            vec![Relationship {
                id: "rel-1".to_string(),
                from_table: "User".to_string(),
                from_column: "id".to_string(),
                to_table: "Order".to_string(),
                to_column: "id".to_string(),
                relationship_type: RelationshipType::OneToMany,
                description: None,
            }],
        ))
    }

    #[test]
    fn test_render_basic() {
        let svg = render(&state());
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"data-table="User""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_render_unicode() {
        let state = EditorState::new(LayoutModel::from_parts(
            vec![TableNode::new("ユーザー").with_column(Column::new("名前", "文字列"))],
            vec![],
        ));
        let svg = render(&state);
        assert!(svg.contains("ユーザー"));
        assert!(svg.contains("名前"));
    }

    #[test]
    fn test_render_with_edges() {
        let svg = render(&state());
        assert!(svg.contains(r#"class="edge""#));
        assert!(svg.contains(r#"data-relationship-id="rel-1""#));
        assert!(svg.contains("one-to-many"));
        assert!(svg.contains("url(#arrow-blue)"));
    }

    #[test]
    fn test_marker_follows_relationship_type() {
        let mut state = state();
        let mut rel = state.layout.relationship("rel-1").unwrap().clone();
        rel.relationship_type = RelationshipType::ManyToOne;
        state.layout.add_relationship(rel);
        let svg = render(&state);
        assert!(svg.contains("url(#arrow-green)"));
        assert!(!svg.contains("url(#arrow-blue)"));
    }

    #[test]
    fn test_render_connect_banner() {
        let mut state = state();
        state.gesture = GestureState::ConnectAwaitingTarget {
            source: "User".to_string(),
        };
        let svg = render(&state);
        assert!(svg.contains("Connection Mode Active"));
        assert!(svg.contains("From: User -&gt; Click target table"));
        assert!(svg.contains(r#"class="entity connect-source""#));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_xml(r#"<a & "b">"#), "&lt;a &amp; &quot;b&quot;&gt;");
    }
}

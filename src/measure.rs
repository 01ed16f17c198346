use crate::model::Column;
use unicode_width::UnicodeWidthStr;

pub struct TextMetrics {
    pub char_width: f64,
    pub label_char_width: f64,
    pub line_height: f64,
    pub label_height: f64,
    pub padding_x: f64,
    pub padding_y: f64,
    pub header_padding: f64,
    pub min_node_width: f64,
    pub min_node_height: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            label_char_width: 6.0,
            line_height: 20.0,
            label_height: 14.0,
            padding_x: 12.0,
            padding_y: 8.0,
            header_padding: 4.0,
            min_node_width: 192.0,
            min_node_height: 60.0,
        }
    }
}

impl TextMetrics {
    pub fn text_width(&self, text: &str) -> f64 {
        let width = UnicodeWidthStr::width(text);
        width as f64 * self.char_width
    }

    pub fn label_size(&self, text: &str) -> (f64, f64) {
        let width = UnicodeWidthStr::width(text) as f64 * self.label_char_width;
        (width, self.label_height)
    }

    pub fn header_height(&self, description: Option<&str>) -> f64 {
        let lines = if description.is_some() { 2.0 } else { 1.0 };
        self.line_height * lines + self.header_padding * 2.0
    }

    /// Row text for a column: name, type, then the PK and NOT NULL markers.
    pub fn column_row(column: &Column) -> (String, String) {
        let mut typ = column.typ.clone();
        if column.primary_key {
            typ.push_str(" PK");
        }
        if !column.nullable {
            typ.push_str(" *");
        }
        (column.name.clone(), typ)
    }

    pub fn node_size(
        &self,
        label: &str,
        description: Option<&str>,
        columns: &[Column],
    ) -> (f64, f64) {
        let header_width = description
            .map(|d| self.text_width(d))
            .unwrap_or(0.0)
            .max(self.text_width(label));

        let max_col_width = columns
            .iter()
            .map(|c| {
                let (name, typ) = Self::column_row(c);
                self.text_width(&name) + self.text_width(&typ) + self.char_width * 2.0
            })
            .fold(0.0, f64::max);

        let content_width = header_width.max(max_col_width) + self.padding_x * 2.0;
        let width = content_width.max(self.min_node_width);

        let body_height = if columns.is_empty() {
            0.0
        } else {
            columns.len() as f64 * self.line_height + self.padding_y * 2.0
        };

        let height = (self.header_height(description) + body_height).max(self.min_node_height);

        (width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_width() {
        let m = TextMetrics::default();
        assert_eq!(m.text_width("User"), 4.0 * 8.0);
    }

    #[test]
    fn test_unicode_width() {
        let m = TextMetrics::default();
        // 全角文字は幅2
        assert_eq!(m.text_width("ユーザー"), 8.0 * 8.0);
    }

    #[test]
    fn test_node_size_no_columns() {
        let m = TextMetrics::default();
        let (w, h) = m.node_size("User", None, &[]);
        assert_eq!(w, m.min_node_width);
        assert_eq!(h, m.min_node_height);
    }

    #[test]
    fn test_node_size_with_columns() {
        let m = TextMetrics::default();
        let columns = vec![Column::new("id", "int").pk(), Column::new("name", "string")];
        let (w, h) = m.node_size("User", None, &columns);
        assert!(w >= m.min_node_width);
        assert_eq!(h, m.header_height(None) + 2.0 * m.line_height + m.padding_y * 2.0);
    }

    #[test]
    fn test_long_description_widens_node() {
        let m = TextMetrics::default();
        let description = "Daily production data by line and shift";
        let (w, _) = m.node_size("production_data", Some(description), &[]);
        assert_eq!(w, m.text_width(description) + m.padding_x * 2.0);
    }

    #[test]
    fn test_column_row_markers() {
        let (_, typ) = TextMetrics::column_row(&Column::new("id", "int").pk());
        assert_eq!(typ, "int PK *");
        let (_, typ) = TextMetrics::column_row(&Column::new("note", "string").nullable());
        assert_eq!(typ, "string");
    }
}

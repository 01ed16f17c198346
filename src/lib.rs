pub mod editor;
pub mod error;
pub mod gesture;
pub mod inspector;
pub mod layout;
pub mod logging;
pub mod measure;
pub mod model;
pub mod persistence;
pub mod proposal;
pub mod render;
pub mod settings;
pub mod svg;

use wasm_bindgen::prelude::*;

use editor::EditorState;
use inspector::Inspector;
use layout::LayoutModel;
use model::Snapshot;
use render::CanvasRenderer;
use svg::SvgRenderer;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn load_snapshot(snapshot_json: &str) -> Result<LayoutModel, String> {
    let snapshot = Snapshot::from_json(snapshot_json).map_err(|e| e.to_string())?;
    Ok(LayoutModel::from_parts(snapshot.tables, snapshot.relationships))
}

/// Render a diagram snapshot to SVG, optionally highlighting one table.
#[wasm_bindgen(js_name = "renderDiagram")]
pub fn render_diagram(snapshot_json: &str, selected: Option<String>) -> Result<String, String> {
    let mut state = EditorState::new(load_snapshot(snapshot_json)?);
    if let Some(table) = selected {
        state.selection.select(table);
    }
    let scene = CanvasRenderer::default().render(&state);
    Ok(SvgRenderer::default().render(&scene))
}

/// Table details for the inspector pane, as JSON.
#[wasm_bindgen(js_name = "inspectTable")]
pub fn inspect_table(snapshot_json: &str, table: &str) -> Result<String, String> {
    let model = load_snapshot(snapshot_json)?;
    let details = Inspector::table_details(&model, table)
        .ok_or_else(|| layout::LayoutError::UnknownTable(table.to_string()).to_string())?;
    serde_json::to_string(&details).map_err(|e| e.to_string())
}

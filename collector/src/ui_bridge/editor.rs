use collectcore::prelude::{PlotEditor, PlotEditorRequest};
use log::info;

/// Console stand-in for the pop-up annotation window. Composes the editor
/// URL the way the browser shell opens it.
pub struct EditorBridge {
    root: String,
}

impl EditorBridge {
    pub fn new() -> Self {
        Self {
            root: String::new(),
        }
    }

    fn editor_url(&self, request: &PlotEditorRequest) -> String {
        format!(
            "{}/geo-dash?editable=false&title={}&pid={}&aoi={}&daterange=&bcenter={},{}&bradius={}",
            self.root,
            request.title,
            request.project_id,
            request.extent.as_query(),
            request.center.lon,
            request.center.lat,
            request.radius
        )
    }
}

impl Default for EditorBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl PlotEditor for EditorBridge {
    fn open_plot_editor(&self, request: &PlotEditorRequest) {
        info!("[EDITOR] opening {}", self.editor_url(request));
    }
}

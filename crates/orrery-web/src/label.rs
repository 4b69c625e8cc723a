use orrery_engine::LabelElement;
use web_sys::HtmlElement;

/// A DOM overlay element driven by the label placement engine.
pub struct DomLabel(pub HtmlElement);

impl LabelElement for DomLabel {
    fn set_opacity(&mut self, opacity: f32) {
        let style = self.0.style();
        // Hidden labels also stop taking pointer events.
        let _ = style.set_property("opacity", &format!("{opacity:.3}"));
        let _ = style.set_property(
            "visibility",
            if opacity > 0.0 { "visible" } else { "hidden" },
        );
    }
}

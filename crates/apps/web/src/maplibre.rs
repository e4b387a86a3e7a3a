//! MapLibre GL JS behind the [`MapViewport`] seam.

use foundation::camera::CameraPose;
use foundation::ids::LayerId;
use layers::layer::{LayerDef, Visibility};
use layers::symbology::LayerStyle;
use layers::viewport::{MapViewport, ViewportError};
use serde_json::{Value, json};
use story::MapConfig;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(inline_js = "
export function story_map_create(container, styleUrl, lon, lat, zoom, bearing, pitch) {
    return new maplibregl.Map({
        container,
        style: styleUrl,
        center: [lon, lat],
        zoom,
        bearing,
        pitch,
        fadeDuration: 0,
        attributionControl: false,
        antialias: false,
        preserveDrawingBuffer: false,
    });
}

export function story_map_on(map, event, cb) {
    map.on(event, cb);
}

export function story_map_add_scale(map, maxWidth) {
    map.addControl(new maplibregl.ScaleControl({ maxWidth, unit: 'metric' }), 'bottom-left');
}

export function story_map_add_source(map, id, url) {
    if (!map.getSource(id)) {
        map.addSource(id, { type: 'geojson', data: url });
    }
}

export function story_map_add_layer(map, specJson) {
    map.addLayer(JSON.parse(specJson));
}

export function story_map_has_layer(map, id) {
    return !!map.getLayer(id);
}

export function story_map_get_visibility(map, id) {
    if (!map.getLayer(id)) return null;
    return map.getLayoutProperty(id, 'visibility') ?? 'visible';
}

export function story_map_set_visibility(map, id, visibility) {
    map.setLayoutProperty(id, 'visibility', visibility);
}

export function story_map_fly_to(map, lon, lat, zoom, bearing, pitch, duration) {
    map.flyTo({ center: [lon, lat], zoom, bearing, pitch, duration });
}
")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn story_map_create(
        container: &str,
        style_url: &str,
        lon: f64,
        lat: f64,
        zoom: f64,
        bearing: f64,
        pitch: f64,
    ) -> Result<JsValue, JsValue>;

    fn story_map_on(map: &JsValue, event: &str, cb: &js_sys::Function);

    #[wasm_bindgen(catch)]
    fn story_map_add_scale(map: &JsValue, max_width: u32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn story_map_add_source(map: &JsValue, id: &str, url: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn story_map_add_layer(map: &JsValue, spec_json: &str) -> Result<(), JsValue>;

    fn story_map_has_layer(map: &JsValue, id: &str) -> bool;

    fn story_map_get_visibility(map: &JsValue, id: &str) -> Option<String>;

    #[wasm_bindgen(catch)]
    fn story_map_set_visibility(map: &JsValue, id: &str, visibility: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn story_map_fly_to(
        map: &JsValue,
        lon: f64,
        lat: f64,
        zoom: f64,
        bearing: f64,
        pitch: f64,
        duration: u32,
    ) -> Result<(), JsValue>;
}

pub(crate) fn js_error_text(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

/// MapLibre layer definition for `def`. Layers start visible; the story
/// hides them once the map reports ready.
pub fn layer_spec(def: &LayerDef) -> Value {
    let (paint, mut layout) = match &def.style {
        LayerStyle::Fill {
            color,
            opacity,
            outline,
        } => (
            json!({
                "fill-color": color.to_string(),
                "fill-opacity": opacity,
                "fill-outline-color": outline.to_string(),
            }),
            json!({}),
        ),
        LayerStyle::Circle {
            radius_px,
            color,
            opacity,
            stroke_width_px,
            stroke_color,
        } => (
            json!({
                "circle-radius": radius_px,
                "circle-color": color.to_string(),
                "circle-opacity": opacity,
                "circle-stroke-width": stroke_width_px,
                "circle-stroke-color": stroke_color.to_string(),
            }),
            json!({}),
        ),
        LayerStyle::Label {
            field,
            font,
            color,
            halo_color,
            halo_width_px,
            size_steps,
        } => {
            // ["step", ["zoom"], base, z1, s1, z2, s2, ...]
            let (base, stops) = match size_steps.split_first() {
                Some((&(z, s), rest)) if z <= 0.0 => (s, rest),
                _ => (0.0, size_steps.as_slice()),
            };
            let mut size = vec![json!("step"), json!(["zoom"]), json!(base)];
            for (z, s) in stops {
                size.push(json!(z));
                size.push(json!(s));
            }
            (
                json!({
                    "text-color": color.to_string(),
                    "text-halo-color": halo_color.to_string(),
                    "text-halo-width": halo_width_px,
                    "text-halo-blur": 0.2,
                }),
                json!({
                    "text-field": ["get", field],
                    "text-font": [font],
                    "text-size": size,
                    "text-offset": [0, -1.5],
                    "text-anchor": "bottom",
                    "text-allow-overlap": false,
                    "text-ignore-placement": false,
                    "text-variable-anchor": ["bottom", "bottom-left", "bottom-right", "top", "left", "right"],
                    "text-radial-offset": 0.5,
                    "text-justify": "center",
                    "text-optional": true,
                }),
            )
        }
    };
    if let Some(obj) = layout.as_object_mut() {
        obj.insert("visibility".into(), json!(Visibility::Visible.as_str()));
    }
    json!({
        "id": def.id.as_str(),
        "type": def.style.kind(),
        "source": def.source,
        "paint": paint,
        "layout": layout,
    })
}

pub struct MapLibreViewport {
    map: JsValue,
    ready: bool,
}

impl MapLibreViewport {
    pub fn create(container: &str, config: &MapConfig) -> Result<Self, JsValue> {
        let pose = &config.initial;
        let map = story_map_create(
            container,
            &config.style_url,
            pose.center.lon_deg,
            pose.center.lat_deg,
            pose.zoom,
            pose.bearing_deg,
            pose.pitch_deg,
        )?;
        Ok(Self { map, ready: false })
    }

    pub fn on(&self, event: &str, cb: &js_sys::Function) {
        story_map_on(&self.map, event, cb);
    }

    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    pub fn add_scale(&self, max_width_px: u32) -> Result<(), JsValue> {
        story_map_add_scale(&self.map, max_width_px)
    }

    /// Adds every layer (and its source, once). A failing layer is logged and
    /// skipped; the rest still load.
    pub fn install_layers<'a>(&self, defs: impl IntoIterator<Item = &'a LayerDef>) -> usize {
        let mut added = 0;
        for def in defs {
            let result = story_map_add_source(&self.map, &def.source, &def.data_url)
                .and_then(|()| story_map_add_layer(&self.map, &layer_spec(def).to_string()));
            match result {
                Ok(()) => added += 1,
                Err(err) => {
                    tracing::error!(layer = %def.id, error = %js_error_text(&err), "failed to add layer");
                }
            }
        }
        added
    }
}

impl MapViewport for MapLibreViewport {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn has_layer(&self, id: &LayerId) -> bool {
        story_map_has_layer(&self.map, id.as_str())
    }

    fn visibility(&self, id: &LayerId) -> Option<Visibility> {
        story_map_get_visibility(&self.map, id.as_str()).and_then(|v| Visibility::parse(&v))
    }

    fn set_visibility(&mut self, id: &LayerId, visibility: Visibility) -> Result<(), ViewportError> {
        if !self.ready {
            return Err(ViewportError::NotReady);
        }
        story_map_set_visibility(&self.map, id.as_str(), visibility.as_str())
            .map_err(|e| ViewportError::Renderer(js_error_text(&e)))
    }

    fn fly_to(&mut self, pose: &CameraPose) -> Result<(), ViewportError> {
        story_map_fly_to(
            &self.map,
            pose.center.lon_deg,
            pose.center.lat_deg,
            pose.zoom,
            pose.bearing_deg,
            pose.pitch_deg,
            pose.duration.get(),
        )
        .map_err(|e| ViewportError::Renderer(js_error_text(&e)))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use story::StoryConfig;

    use super::layer_spec;

    #[test]
    fn fill_layer_spec() {
        let config = StoryConfig::builtin();
        let def = config
            .layers
            .iter()
            .find(|l| l.id == "hiroshima_detruit_layer")
            .unwrap();
        let spec = layer_spec(def);
        assert_eq!(spec["type"], json!("fill"));
        assert_eq!(spec["source"], json!("hiroshima_detruit"));
        assert_eq!(spec["paint"]["fill-color"], json!("#af0d1d"));
        assert_eq!(spec["paint"]["fill-outline-color"], json!("rgba(0, 0, 0, 0.2)"));
        assert_eq!(spec["layout"]["visibility"], json!("visible"));
    }

    #[test]
    fn label_layer_uses_zoom_steps() {
        let config = StoryConfig::builtin();
        let def = config.layers.iter().find(|l| l.id == "poi_labels").unwrap();
        let spec = layer_spec(def);
        assert_eq!(spec["type"], json!("symbol"));
        assert_eq!(spec["layout"]["text-field"], json!(["get", "nom"]));
        assert_eq!(
            spec["layout"]["text-size"],
            json!(["step", ["zoom"], 0.0, 10.0, 8.0, 12.0, 12.0, 14.0, 13.0])
        );
    }
}

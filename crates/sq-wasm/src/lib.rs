#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use sq_core::{Annotation, AnnotatorConfig, DocumentKind, Placement};
use sq_host::{AnnotationSession, AnnotationUpdate, DocumentSnapshot, HostEvent};
use sq_parser::annotate;
use wasm_bindgen::JsValue;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::wasm_bindgen;

/// One label in the shape editor extensions consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WasmAnnotation {
    pub line: usize,
    pub start_column: usize,
    pub end_column: usize,
    pub label: String,
}

impl From<&Annotation> for WasmAnnotation {
    fn from(value: &Annotation) -> Self {
        Self {
            line: value.line,
            start_column: value.start_column,
            end_column: value.end_column,
            label: value.label.clone(),
        }
    }
}

/// CSS-ready decoration attributes for the active theme.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecorationStyle {
    pub placement: Placement,
    pub color: String,
    pub background_color: String,
    pub border: Option<String>,
    pub font_size: String,
    pub border_radius: String,
    pub padding: String,
    pub margin: String,
}

impl DecorationStyle {
    #[must_use]
    pub fn from_config(config: &AnnotatorConfig) -> Self {
        let colors = config.active_colors();
        let style = &config.style;
        Self {
            placement: config.placement,
            color: colors.foreground.clone(),
            background_color: colors.background.clone(),
            border: colors.border.as_ref().map(|color| format!("1px solid {color}")),
            font_size: format!("{}em", style.font_scale),
            border_radius: format!("{}em", style.border_radius_em),
            padding: format!("0 {}em", style.padding_em),
            margin: format!("0 {}em", style.margin_em),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateOutput {
    pub kind: DocumentKind,
    pub annotations: Vec<WasmAnnotation>,
}

/// Event shape accepted by [`Annotator::handle`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum WasmEvent {
    Opened {
        uri: String,
        language_id: String,
        text: String,
    },
    Changed {
        uri: String,
        language_id: String,
        text: String,
    },
    SelectionChanged {
        uri: String,
        language_id: String,
        text: String,
    },
    Closed {
        uri: String,
    },
    ConfigChanged {
        #[serde(default)]
        config: AnnotatorConfig,
    },
}

impl From<WasmEvent> for HostEvent {
    fn from(value: WasmEvent) -> Self {
        let snapshot = |uri: String, language_id: &str, text: String| {
            DocumentSnapshot::new(uri, DocumentKind::from_language_id(language_id), text)
        };
        match value {
            WasmEvent::Opened {
                uri,
                language_id,
                text,
            } => Self::Opened(snapshot(uri, &language_id, text)),
            WasmEvent::Changed {
                uri,
                language_id,
                text,
            } => Self::Changed(snapshot(uri, &language_id, text)),
            WasmEvent::SelectionChanged {
                uri,
                language_id,
                text,
            } => Self::SelectionChanged(snapshot(uri, &language_id, text)),
            WasmEvent::Closed { uri } => Self::Closed { uri },
            WasmEvent::ConfigChanged { config } => Self::ConfigChanged(config),
        }
    }
}

/// Update shape returned by [`Annotator::handle`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum WasmUpdate {
    Replace {
        uri: String,
        annotations: Vec<WasmAnnotation>,
        style: DecorationStyle,
    },
    Clear {
        uri: String,
    },
}

impl WasmUpdate {
    /// `None` for updates that need no host action.
    fn from_update(update: &AnnotationUpdate, config: &AnnotatorConfig) -> Option<Self> {
        match update {
            AnnotationUpdate::Replace {
                uri, annotations, ..
            }
            | AnnotationUpdate::Restyle { uri, annotations } => Some(Self::Replace {
                uri: uri.clone(),
                annotations: annotations.iter().map(WasmAnnotation::from).collect(),
                style: DecorationStyle::from_config(config),
            }),
            AnnotationUpdate::Clear { uri } => Some(Self::Clear { uri: uri.clone() }),
            AnnotationUpdate::Unchanged { .. } => None,
        }
    }
}

fn js_error(message: impl Into<String>) -> JsValue {
    JsValue::from_str(&message.into())
}

fn parse_js_value_or_default<T>(value: Option<JsValue>) -> Result<T, JsValue>
where
    T: for<'de> Deserialize<'de> + Default,
{
    match value {
        None => Ok(T::default()),
        Some(raw) if raw.is_undefined() || raw.is_null() => Ok(T::default()),
        Some(raw) => {
            #[cfg(target_arch = "wasm32")]
            {
                serde_wasm_bindgen::from_value(raw)
                    .map_err(|err| js_error(format!("invalid config: {err}")))
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                let _ = raw;
                Ok(T::default())
            }
        }
    }
}

fn parse_js_value<T>(value: JsValue) -> Result<T, JsValue>
where
    T: for<'de> Deserialize<'de>,
{
    #[cfg(target_arch = "wasm32")]
    {
        serde_wasm_bindgen::from_value(value).map_err(|err| js_error(format!("invalid event: {err}")))
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let json = value
            .as_string()
            .ok_or_else(|| js_error("events must be JSON strings off wasm32"))?;
        serde_json::from_str(&json).map_err(|err| js_error(format!("invalid event: {err}")))
    }
}

fn to_js_value<T>(value: &T) -> Result<JsValue, JsValue>
where
    T: Serialize,
{
    #[cfg(target_arch = "wasm32")]
    {
        serde_wasm_bindgen::to_value(value)
            .map_err(|err| js_error(format!("failed to serialize response: {err}")))
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        serde_json::to_string(value)
            .map(|json| JsValue::from_str(&json))
            .map_err(|err| js_error(format!("failed to serialize response: {err}")))
    }
}

/// Annotations for one document, without any session state.
#[must_use]
pub fn annotate_document(text: &str, language_id: &str) -> AnnotateOutput {
    let kind = DocumentKind::from_language_id(language_id);
    AnnotateOutput {
        kind,
        annotations: annotate(text, kind).iter().map(WasmAnnotation::from).collect(),
    }
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen(js_name = annotate))]
pub fn annotate_js(text: &str, language_id: &str) -> Result<JsValue, JsValue> {
    to_js_value(&annotate_document(text, language_id))
}

/// Stateful annotator for one editor instance.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
#[derive(Debug, Clone, Default)]
pub struct Annotator {
    session: AnnotationSession,
}

impl Annotator {
    pub fn with_config(config: AnnotatorConfig) -> Result<Self, String> {
        let session = AnnotationSession::new(config).map_err(|err| err.to_string())?;
        Ok(Self { session })
    }

    /// Handle one event; the result lists only updates the host must apply.
    pub fn handle_event(&mut self, event: WasmEvent) -> Result<Vec<WasmUpdate>, String> {
        let updates = self
            .session
            .handle(event.into())
            .map_err(|err| err.to_string())?;
        let config = self.session.config();
        Ok(updates
            .iter()
            .filter_map(|update| WasmUpdate::from_update(update, config))
            .collect())
    }

    #[must_use]
    pub fn style(&self) -> DecorationStyle {
        DecorationStyle::from_config(self.session.config())
    }
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
impl Annotator {
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(constructor))]
    pub fn new(config: Option<JsValue>) -> Result<Annotator, JsValue> {
        let config: AnnotatorConfig = parse_js_value_or_default(config)?;
        Self::with_config(config).map_err(js_error)
    }

    pub fn handle(&mut self, event: JsValue) -> Result<JsValue, JsValue> {
        let event: WasmEvent = parse_js_value(event)?;
        let updates = self.handle_event(event).map_err(js_error)?;
        to_js_value(&updates)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(js_name = setConfig))]
    pub fn set_config(&mut self, config: Option<JsValue>) -> Result<JsValue, JsValue> {
        let config: AnnotatorConfig = parse_js_value_or_default(config)?;
        let updates = self
            .handle_event(WasmEvent::ConfigChanged { config })
            .map_err(js_error)?;
        to_js_value(&updates)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(js_name = decorationStyle))]
    pub fn decoration_style(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.style())
    }
}

#[cfg(test)]
mod tests {
    use sq_core::{AnnotatorConfig, DocumentKind, LabelColors, Placement, ThemeKind};

    use super::{Annotator, DecorationStyle, WasmEvent, WasmUpdate, annotate_document};

    const DIAGRAM: &str = "sequenceDiagram\nautonumber\nAlice->>Bob: Hello\nBob-->>Alice: Hi";

    fn changed(uri: &str, language_id: &str, text: &str) -> WasmEvent {
        WasmEvent::Changed {
            uri: uri.to_string(),
            language_id: language_id.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn annotate_document_maps_language_id() {
        let output = annotate_document(DIAGRAM, "mermaid");
        assert_eq!(output.kind, DocumentKind::Mermaid);
        assert_eq!(output.annotations.len(), 2);
        assert_eq!(output.annotations[1].line, 3);

        let plaintext = annotate_document(DIAGRAM, "plaintext");
        assert_eq!(plaintext.kind, DocumentKind::Other);
        assert!(plaintext.annotations.is_empty());
    }

    #[test]
    fn default_style_matches_light_badge() {
        let style = DecorationStyle::from_config(&AnnotatorConfig::default());
        assert_eq!(style.color, "#000000");
        assert_eq!(style.background_color, "#ffffff");
        assert_eq!(style.font_size, "0.8em");
        assert_eq!(style.border_radius, "1em");
        assert_eq!(style.padding, "0 0.2em");
        assert_eq!(style.margin, "0 0.5em");
        assert_eq!(style.border, None);
    }

    #[test]
    fn annotator_skips_unchanged_updates() {
        let mut annotator = Annotator::default();
        let first = annotator
            .handle_event(changed("a.md", "markdown", &format!("```mermaid\n{DIAGRAM}\n```")))
            .expect("handle");
        assert!(matches!(
            first.as_slice(),
            [WasmUpdate::Replace { annotations, .. }] if annotations.len() == 2
        ));

        let second = annotator
            .handle_event(changed("a.md", "markdown", &format!("```mermaid\n{DIAGRAM}\n```")))
            .expect("handle");
        assert!(second.is_empty());
    }

    #[test]
    fn config_change_restyles_with_new_theme() {
        let mut annotator = Annotator::default();
        annotator
            .handle_event(changed("a.mmd", "mermaid", DIAGRAM))
            .expect("handle");
        let config = AnnotatorConfig {
            theme: ThemeKind::Dark,
            placement: Placement::After,
            ..AnnotatorConfig::default()
        };
        let updates = annotator
            .handle_event(WasmEvent::ConfigChanged { config })
            .expect("handle");
        let [WasmUpdate::Replace { style, .. }] = updates.as_slice() else {
            panic!("expected one replace, got {updates:?}");
        };
        assert_eq!(style.placement, Placement::After);
        assert_eq!(style.background_color, LabelColors::dark().background);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = AnnotatorConfig {
            max_lines: 0,
            ..AnnotatorConfig::default()
        };
        let err = Annotator::with_config(config).expect_err("zero max-lines");
        assert!(err.contains("max-lines"));
    }

    #[test]
    fn events_use_camel_case_wire_names() {
        let event: WasmEvent = serde_json::from_str(
            r#"{"type":"selectionChanged","uri":"a.md","languageId":"markdown","text":""}"#,
        )
        .expect("event");
        assert_eq!(
            event,
            WasmEvent::SelectionChanged {
                uri: "a.md".to_string(),
                language_id: "markdown".to_string(),
                text: String::new(),
            }
        );

        let update = serde_json::to_value(WasmUpdate::Clear {
            uri: "a.md".to_string(),
        })
        .expect("serialize");
        assert_eq!(update, serde_json::json!({ "type": "clear", "uri": "a.md" }));
    }
}

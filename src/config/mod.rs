use serde::{Deserialize, Serialize};

/// Runtime configuration.
///
/// In the browser this is read from an optional `window.BAGUETTE` object (see
/// `web::load_config`); every key has a default so pages only override what differs.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Websocket endpoint written to `<body ws-connect>` when the page sets none.
    pub default_endpoint: String,
    /// Transport header carrying the originating event's type name.
    pub trigger_header: String,
    /// Marker attribute (without `data-`) that delimits a scope.
    pub scope_attribute: String,
    /// Parameter key for the scope and for the render template.
    pub render_key: String,
    /// Reserved prefix that marks an event name as an intent.
    pub intent_prefix: String,
    /// Suffix of the companion element that shows a request is in flight (`#<id><suffix>`).
    pub indicator_suffix: String,
    /// Fallback busy class when the rendering system does not expose one.
    pub request_class: String,
    pub drag: DragConfig,
    pub markup: MarkupNames,
    pub log_level: String,
    /// Ask before navigating away from the page.
    pub confirm_unload: bool,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            default_endpoint: "127.0.0.1:8080/".to_string(),
            trigger_header: "HX-Trigger-Event".to_string(),
            scope_attribute: "scope".to_string(),
            render_key: "render".to_string(),
            intent_prefix: "@".to_string(),
            indicator_suffix: "-indicator".to_string(),
            request_class: "htmx-request".to_string(),
            drag: DragConfig::default(),
            markup: MarkupNames::default(),
            log_level: "info".to_string(),
            confirm_unload: true,
        }
    }

    /// Parse a JSON object, filling every missing key from the defaults.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DragConfig {
    pub animation_ms: u32,
    /// Shared group name for hierarchical containers.
    pub tree_group: String,
    pub empty_insert_threshold: u32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            animation_ms: 150,
            tree_group: "fe-folder".to_string(),
            empty_insert_threshold: 10,
        }
    }
}

/// Ids and classes the server-rendered markup uses.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MarkupNames {
    pub list_id: String,
    pub list_title_class: String,
    pub item_class: String,
    pub item_text_class: String,
    pub drag_handle_class: String,
    pub folder_class: String,
    pub file_folder_class: String,
    pub new_list_link_id: String,
    pub context_menu_id: String,
    pub selected_class: String,
    pub label_class: String,
}

impl Default for MarkupNames {
    fn default() -> Self {
        Self {
            list_id: "todo-list".to_string(),
            list_title_class: "TodoList-title".to_string(),
            item_class: "TodoItem".to_string(),
            item_text_class: "TodoItem-text".to_string(),
            drag_handle_class: "TodoItem-dragHandle".to_string(),
            folder_class: "FE-Folder".to_string(),
            file_folder_class: "FE-FileFolder".to_string(),
            new_list_link_id: "new-list-link".to_string(),
            context_menu_id: "fe-context-menu".to_string(),
            selected_class: "selected".to_string(),
            label_class: "FE-Label".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg = ClientConfig::from_json(
            r#"{ "default_endpoint": "example.org/ws", "drag": { "animation_ms": 0 } }"#,
        )
        .expect("config should parse");
        assert_eq!(cfg.default_endpoint, "example.org/ws");
        assert_eq!(cfg.drag.animation_ms, 0);
        assert_eq!(cfg.drag.tree_group, "fe-folder");
        assert_eq!(cfg.trigger_header, "HX-Trigger-Event");
        assert_eq!(cfg.markup.list_id, "todo-list");
    }

    #[test]
    fn test_markup_names_only_what_is_read() {
        let markup = serde_json::to_value(MarkupNames::default()).expect("serialize");
        assert!(markup.get("main_id").is_none());
        assert_eq!(markup["list_id"], "todo-list");

        // Pages that still set the old key keep working.
        let cfg = ClientConfig::from_json(r#"{ "markup": { "main_id": "app", "list_id": "l" } }"#)
            .expect("config should parse");
        assert_eq!(cfg.markup.list_id, "l");
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = ClientConfig::from_json("{ nope").expect_err("should fail");
        assert!(matches!(err, crate::error::Error::Config(_)));
    }

    #[test]
    fn test_log_level_falls_back_to_info() {
        let mut cfg = ClientConfig::new();
        assert_eq!(cfg.log_level(), log::LevelFilter::Info);
        cfg.log_level = "debug".to_string();
        assert_eq!(cfg.log_level(), log::LevelFilter::Debug);
        cfg.log_level = "loud".to_string();
        assert_eq!(cfg.log_level(), log::LevelFilter::Info);
    }
}

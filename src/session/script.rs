use crate::session::ElementState;

/// JavaScript snippets evaluated in the page for DOM primitives that CDP
/// has no direct command for.
pub struct PageScript;

impl PageScript {
    /// Quote a CSS selector as a JavaScript string literal
    fn quote(selector: &str) -> String {
        // JSON string syntax is a subset of JavaScript string syntax
        serde_json::Value::String(selector.to_string()).to_string()
    }

    /// Evaluates to `"missing"`, `"disabled"` or `"enabled"`
    pub fn element_state(selector: &str) -> String {
        let selector = Self::quote(selector);
        format!(
            r#"
            (() => {{
                const el = document.querySelector({selector});
                if (!el) return 'missing';
                if (el.disabled || el.hasAttribute('disabled')
                    || el.getAttribute('aria-disabled') === 'true') {{
                    return 'disabled';
                }}
                return 'enabled';
            }})()
            "#
        )
    }

    /// Evaluates to the element's `scrollHeight`, or `-1` when it is missing
    pub fn scroll_height(selector: &str) -> String {
        let selector = Self::quote(selector);
        format!(
            r#"
            (() => {{
                const el = document.querySelector({selector});
                return el ? el.scrollHeight : -1;
            }})()
            "#
        )
    }

    /// Scrolls the element to its bottom; evaluates to whether it exists
    pub fn scroll_to_bottom(selector: &str) -> String {
        let selector = Self::quote(selector);
        format!(
            r#"
            (() => {{
                const el = document.querySelector({selector});
                if (!el) return false;
                el.scrollTo(0, el.scrollHeight);
                return true;
            }})()
            "#
        )
    }

    pub fn parse_scroll_height(value: f64) -> Option<f64> {
        (value >= 0.0).then_some(value)
    }

    pub fn parse_element_state(value: &str) -> ElementState {
        match value {
            "enabled" => ElementState::Enabled,
            "disabled" => ElementState::Disabled,
            _ => ElementState::Missing,
        }
    }
}

//! Resources compiled into the binary.
//!
//! - `serve` - Dev server resources (live reload client)

pub mod serve {
    /// URL path the dev server answers with the reload client.
    pub const RELOAD_JS_PATH: &str = "/__devwatch/reload.js";

    const RELOAD_JS: &str = include_str!("serve/reload.js");
    const WS_PORT_PLACEHOLDER: &str = "__DEVWATCH_WS_PORT__";

    /// Live reload client pointed at `ws_port` on the page's own host.
    pub fn reload_js(ws_port: u16) -> String {
        RELOAD_JS.replace(WS_PORT_PLACEHOLDER, &ws_port.to_string())
    }

    /// `<script>` tag injected into served HTML.
    pub fn reload_script_tag() -> String {
        format!(r#"<script src="{RELOAD_JS_PATH}"></script>"#)
    }
}

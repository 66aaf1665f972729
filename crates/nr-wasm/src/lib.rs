//! WebAssembly bindings for Nitter Redirect
//!
//! The background script owns one `Redirector`, feeds it the initial
//! `storage.sync` values and every `storage.onChanged` event, and asks it
//! for a replacement URL before each watched navigation.

use wasm_bindgen::prelude::*;

use nr_core::form::INVALID_INSTANCE_MESSAGE;
use nr_core::instance::{self, DEFAULT_INSTANCE, KNOWN_INSTANCES};
use nr_core::policy::{Interceptor, Redirector as CoreRedirector};
use nr_core::settings::{Settings, SettingsChange, DISABLED_KEY, INSTANCE_KEY};
use nr_core::source::{watched_hosts, SERVICE_WORKER_SCOPES};
use nr_core::types::RedirectDecision;
use nr_rules::build_rules_for_state;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info).module_prefix("nr_"));
}

#[wasm_bindgen(js_name = Redirector)]
pub struct WasmRedirector {
    inner: CoreRedirector,
}

#[wasm_bindgen(js_class = Redirector)]
impl WasmRedirector {
    /// Build from the object `storage.sync.get(["instance", "nitterDisabled"])`
    /// resolved to.
    #[wasm_bindgen(constructor)]
    pub fn new(settings: JsValue) -> WasmRedirector {
        WasmRedirector {
            inner: CoreRedirector::new(settings_from_js(&settings)),
        }
    }

    /// A redirector that never redirects, for when storage could not be read.
    pub fn inert() -> WasmRedirector {
        WasmRedirector {
            inner: CoreRedirector::inert(),
        }
    }

    /// Feed a `storage.onChanged` event. Returns true when the state changed.
    #[wasm_bindgen(js_name = applyChanges)]
    pub fn apply_changes(&mut self, changes: JsValue) -> bool {
        self.inner.apply_change(&change_from_js(&changes))
    }

    /// Replacement URL for `url`, or `undefined`.
    pub fn redirect(&self, url: &str) -> Option<String> {
        self.inner.redirect_for(url)
    }

    /// Navigation interception callback: `{ redirectTo }`, `null` when the
    /// navigation proceeds untouched.
    pub fn intercept(&self, url: &str) -> JsValue {
        let response = self.inner.on_before_navigate(url);
        let redirect_to = match response.redirect_to {
            Some(target) => JsValue::from_str(&target),
            None => JsValue::NULL,
        };
        let result = js_sys::Object::new();
        set_field(&result, "redirectTo", &redirect_to);
        result.into()
    }

    /// Full decision for diagnostics: `{ redirect, url?, reason? }`.
    pub fn decide(&self, url: &str) -> JsValue {
        let result = js_sys::Object::new();
        match self.inner.evaluate(url) {
            RedirectDecision::Redirect(target) => {
                set_field(&result, "redirect", &JsValue::from(true));
                set_field(&result, "url", &JsValue::from_str(target.as_str()));
            }
            RedirectDecision::Skip(reason) => {
                set_field(&result, "redirect", &JsValue::from(false));
                set_field(&result, "reason", &JsValue::from_str(reason.as_str()));
            }
        }
        result.into()
    }

    /// Declarative rules for the current state, in browser rule JSON.
    pub fn rules(&self) -> Result<JsValue, JsValue> {
        let rules = build_rules_for_state(self.inner.state());
        let json = serde_json::to_string(&rules)
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize rules: {}", e)))?;
        js_sys::JSON::parse(&json)
    }

    /// Origin of the active instance, or `undefined` while disabled.
    pub fn instance(&self) -> Option<String> {
        self.inner.state().target().map(|t| t.as_origin_string())
    }

    pub fn disabled(&self) -> bool {
        self.inner.state().target().is_none()
    }
}

#[wasm_bindgen]
pub fn is_valid_instance(url: &str) -> bool {
    instance::is_valid_instance(url)
}

#[wasm_bindgen]
pub fn default_instance() -> String {
    DEFAULT_INSTANCE.to_string()
}

#[wasm_bindgen]
pub fn known_instances() -> js_sys::Array {
    KNOWN_INSTANCES.iter().map(|h| JsValue::from_str(h)).collect()
}

#[wasm_bindgen]
pub fn watched_hosts_js() -> js_sys::Array {
    watched_hosts().map(JsValue::from_str).collect()
}

#[wasm_bindgen]
pub fn service_worker_scopes() -> js_sys::Array {
    SERVICE_WORKER_SCOPES.iter().map(|s| JsValue::from_str(s)).collect()
}

#[wasm_bindgen]
pub fn rewrite_url(source: &str, target: &str) -> Option<String> {
    nr_core::rewrite_url(source, target)
}

/// Popup input check: `{ ok, value }` or `{ ok: false, message }`.
#[wasm_bindgen]
pub fn validate_instance_input(input: &str) -> JsValue {
    let result = js_sys::Object::new();
    match instance::normalize_instance(input) {
        Ok(value) => {
            set_field(&result, "ok", &JsValue::from(true));
            set_field(&result, "value", &JsValue::from_str(&value));
        }
        Err(_) => {
            set_field(&result, "ok", &JsValue::from(false));
            set_field(&result, "message", &JsValue::from_str(INVALID_INSTANCE_MESSAGE));
        }
    }
    result.into()
}

fn set_field(object: &js_sys::Object, key: &str, value: &JsValue) {
    let _ = js_sys::Reflect::set(object, &JsValue::from_str(key), value);
}

fn get_field(object: &JsValue, key: &str) -> Option<JsValue> {
    if !object.is_object() {
        return None;
    }
    js_sys::Reflect::get(object, &JsValue::from_str(key))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

fn settings_from_js(value: &JsValue) -> Settings {
    Settings {
        instance: get_field(value, INSTANCE_KEY).and_then(|v| v.as_string()),
        disabled: get_field(value, DISABLED_KEY)
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
    }
}

fn change_from_js(changes: &JsValue) -> SettingsChange {
    let new_value =
        |key: &str| get_field(changes, key).map(|change| get_field(&change, "newValue"));
    SettingsChange {
        instance: new_value(INSTANCE_KEY).map(|v| v.and_then(|v| v.as_string())),
        disabled: new_value(DISABLED_KEY).map(|v| v.and_then(|v| v.as_bool()).unwrap_or(false)),
    }
}

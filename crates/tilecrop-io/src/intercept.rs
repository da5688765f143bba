//! Route the page's own network calls through a [`CoordinateObserver`].
//!
//! Both `window.fetch` and `XMLHttpRequest.prototype.open` are wrapped by
//! a small JS shim that hands the call arguments to Rust before forwarding
//! to the function it replaced. The page (or its bundler) may replace
//! either function again after load, so [`Interceptor::ensure_installed`]
//! is re-run on an interval and re-wraps whatever is current whenever it
//! is no longer our hook.
//!
//! All functions in this module require a browser environment
//! (`wasm32-unknown-unknown` target).

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Interval;
use serde::{Deserialize, Serialize};
use tilecrop_core::CoordinateObserver;
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// Body of the wrapper factory. `observe` sees the raw call arguments;
/// `original` is called with the receiver and arguments untouched, and
/// its return value (the fetch promise) is passed back to the page.
const SHIM_ARGS: &str = "observe, original";
const SHIM_BODY: &str = "return function () { \
    try { observe(arguments[0], arguments[1]); } catch (_) {} \
    return original.apply(this, arguments); \
};";

/// Errors that can occur while installing the hooks.
#[derive(Debug, thiserror::Error)]
pub enum InterceptError {
    /// The global object lacks the API to hook.
    #[error("{0} is not available")]
    Missing(&'static str),

    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for InterceptError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

/// How the hooks are kept in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptConfig {
    /// How often to check that both hooks are still installed.
    pub reinstall_interval_ms: u32,
}

impl InterceptConfig {
    /// Default re-installation interval.
    pub const DEFAULT_REINSTALL_INTERVAL_MS: u32 = 1000;
}

impl Default for InterceptConfig {
    fn default() -> Self {
        Self {
            reinstall_interval_ms: Self::DEFAULT_REINSTALL_INTERVAL_MS,
        }
    }
}

type ObserveFn = Closure<dyn Fn(JsValue, JsValue)>;

/// One hooked function: where it lives and what we last put there.
struct Hook {
    name: &'static str,
    observe: ObserveFn,
    installed: RefCell<Option<js_sys::Function>>,
}

impl Hook {
    fn new(name: &'static str, observe: ObserveFn) -> Self {
        Self {
            name,
            observe,
            installed: RefCell::new(None),
        }
    }

    /// Wrap `owner[key]` unless it is already our hook.
    ///
    /// Returns `true` if a new wrapper was installed.
    fn ensure(&self, owner: &JsValue, key: &str) -> Result<bool, InterceptError> {
        let current = js_sys::Reflect::get(owner, &JsValue::from_str(key))?;
        let Some(current) = current.dyn_ref::<js_sys::Function>() else {
            return Err(InterceptError::Missing(self.name));
        };

        if let Some(ours) = self.installed.borrow().as_ref()
            && js_sys::Object::is(current, ours)
        {
            return Ok(false);
        }

        let factory = js_sys::Function::new_with_args(SHIM_ARGS, SHIM_BODY);
        let hook: js_sys::Function = factory
            .call2(&JsValue::NULL, self.observe.as_ref(), current)?
            .dyn_into()
            .map_err(|e| InterceptError::JsError(format!("shim returned {e:?}")))?;

        js_sys::Reflect::set(owner, &JsValue::from_str(key), &hook)?;
        *self.installed.borrow_mut() = Some(hook);
        Ok(true)
    }
}

/// Keeps the fetch and XHR hooks installed.
pub struct Interceptor {
    fetch: Hook,
    xhr: Hook,
}

impl Interceptor {
    /// Build the hooks for `observer`. Nothing is installed yet.
    #[must_use]
    pub fn new(observer: Rc<CoordinateObserver>) -> Self {
        let on_fetch = Rc::clone(&observer);
        let fetch = Closure::<dyn Fn(JsValue, JsValue)>::new(move |input: JsValue, init: JsValue| {
            let target = fetch_target(
                UrlArg::read(&input),
                string_field(&init, "method"),
                string_field(&input, "method"),
            );
            if let Some(target) = target {
                target.feed(&on_fetch);
            }
        });

        let xhr = Closure::<dyn Fn(JsValue, JsValue)>::new(move |method: JsValue, url: JsValue| {
            if let Some(target) = xhr_target(method.as_string(), UrlArg::read(&url)) {
                target.feed(&observer);
            }
        });

        Self {
            fetch: Hook::new("fetch", fetch),
            xhr: Hook::new("XMLHttpRequest", xhr),
        }
    }

    /// Install whichever hooks are missing.
    ///
    /// # Errors
    ///
    /// Returns [`InterceptError`] if either API is absent or cannot be
    /// replaced. A failure on one API does not prevent the other from
    /// being installed.
    pub fn ensure_installed(&self) -> Result<(), InterceptError> {
        let global = js_sys::global();

        let fetch = self.fetch.ensure(&global, "fetch");
        let xhr = xhr_prototype(&global).and_then(|proto| self.xhr.ensure(&proto, "open"));

        for (name, outcome) in [("fetch", &fetch), ("xhr", &xhr)] {
            if let Ok(true) = outcome {
                debug!(api = name, "request hook installed");
            }
        }
        fetch.and(xhr).map(|_| ())
    }

    /// Install now and keep re-installing every
    /// `config.reinstall_interval_ms`.
    ///
    /// The hooks stay checked for as long as the returned [`Interval`] is
    /// alive.
    ///
    /// # Errors
    ///
    /// Returns the error of the first installation attempt; later
    /// failures are only logged.
    pub fn keep_installed(
        self: &Rc<Self>,
        config: InterceptConfig,
    ) -> Result<Interval, InterceptError> {
        self.ensure_installed()?;

        let this = Rc::clone(self);
        Ok(Interval::new(config.reinstall_interval_ms, move || {
            if let Err(e) = this.ensure_installed() {
                warn!(error = %e, "failed to re-install request hooks");
            }
        }))
    }
}

fn xhr_prototype(global: &JsValue) -> Result<JsValue, InterceptError> {
    let ctor = js_sys::Reflect::get(global, &JsValue::from_str("XMLHttpRequest"))?;
    if ctor.is_undefined() {
        return Err(InterceptError::Missing("XMLHttpRequest"));
    }
    Ok(js_sys::Reflect::get(&ctor, &JsValue::from_str("prototype"))?)
}

/// A request as seen by either hook.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RequestTarget {
    method: Option<String>,
    url: String,
}

impl RequestTarget {
    fn feed(&self, observer: &CoordinateObserver) {
        observer.observe(self.method.as_deref(), &self.url);
    }
}

/// The ways a URL argument can carry its URL: as a string already, or as
/// an object with `url` (`Request`) or `href` (`URL`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct UrlArg {
    text: Option<String>,
    url: Option<String>,
    href: Option<String>,
}

impl UrlArg {
    fn read(value: &JsValue) -> Self {
        Self {
            text: value.as_string(),
            url: string_field(value, "url"),
            href: string_field(value, "href"),
        }
    }

    fn resolve(self) -> Option<String> {
        self.text.or(self.url).or(self.href)
    }
}

/// Target of `fetch(input, init)`.
///
/// The method comes from `init`, then from a `Request` input, and is
/// `None` when neither sets it.
fn fetch_target(
    input: UrlArg,
    init_method: Option<String>,
    input_method: Option<String>,
) -> Option<RequestTarget> {
    Some(RequestTarget {
        url: input.resolve()?,
        method: init_method.or(input_method),
    })
}

/// Target of `XMLHttpRequest.open(method, url)`.
fn xhr_target(method: Option<String>, url: UrlArg) -> Option<RequestTarget> {
    Some(RequestTarget {
        url: url.resolve()?,
        method,
    })
}

fn string_field(value: &JsValue, key: &str) -> Option<String> {
    if !value.is_object() {
        return None;
    }
    js_sys::Reflect::get(value, &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use tilecrop_core::{BackendConfig, ObservationSlot, PixelQueryMatcher, TileIndex};

    const PIXEL_URL: &str = "https://backend.wplace.live/s0/pixel/1023/680?x=500&y=12";

    fn text(url: &str) -> UrlArg {
        UrlArg {
            text: Some(url.to_owned()),
            ..UrlArg::default()
        }
    }

    fn owned(s: &str) -> Option<String> {
        Some(s.to_owned())
    }

    #[test]
    fn fetch_accepts_string_request_and_url_inputs() {
        let from_string = fetch_target(text(PIXEL_URL), None, None).unwrap();
        assert_eq!(from_string.url, PIXEL_URL);
        assert_eq!(from_string.method, None);

        let request = UrlArg {
            url: owned(PIXEL_URL),
            ..UrlArg::default()
        };
        let from_request = fetch_target(request, None, owned("GET")).unwrap();
        assert_eq!(from_request.url, PIXEL_URL);
        assert_eq!(from_request.method.as_deref(), Some("GET"));

        let url = UrlArg {
            href: owned(PIXEL_URL),
            ..UrlArg::default()
        };
        assert_eq!(fetch_target(url, None, None).unwrap().url, PIXEL_URL);
    }

    #[test]
    fn string_form_wins_over_object_fields() {
        let arg = UrlArg {
            text: owned("https://a.example/"),
            url: owned("https://b.example/"),
            href: owned("https://c.example/"),
        };
        assert_eq!(arg.resolve().as_deref(), Some("https://a.example/"));

        let arg = UrlArg {
            text: None,
            url: owned("https://b.example/"),
            href: owned("https://c.example/"),
        };
        assert_eq!(arg.resolve().as_deref(), Some("https://b.example/"));
    }

    #[test]
    fn init_method_takes_precedence_over_request() {
        let target = fetch_target(text(PIXEL_URL), owned("POST"), owned("GET")).unwrap();
        assert_eq!(target.method.as_deref(), Some("POST"));
        let target = fetch_target(text(PIXEL_URL), None, owned("PUT")).unwrap();
        assert_eq!(target.method.as_deref(), Some("PUT"));
    }

    #[test]
    fn missing_url_yields_nothing() {
        assert!(fetch_target(UrlArg::default(), owned("GET"), None).is_none());
        assert!(xhr_target(owned("GET"), UrlArg::default()).is_none());
    }

    #[test]
    fn xhr_pair_is_taken_as_is() {
        let target = xhr_target(owned("get"), text(PIXEL_URL)).unwrap();
        assert_eq!(
            target,
            RequestTarget {
                method: owned("get"),
                url: PIXEL_URL.to_owned(),
            }
        );
        assert_eq!(xhr_target(None, text(PIXEL_URL)).unwrap().method, None);
    }

    #[test]
    fn both_hooks_publish_the_same_coordinate() {
        let matcher = PixelQueryMatcher::new(&BackendConfig::default()).unwrap();
        let observer = CoordinateObserver::new(matcher, ObservationSlot::new());

        fetch_target(text(PIXEL_URL), None, None)
            .unwrap()
            .feed(&observer);
        let via_fetch = observer.slot().peek().unwrap();

        observer.slot().clear();
        assert_eq!(observer.slot().peek(), None);

        xhr_target(owned("GET"), text(PIXEL_URL))
            .unwrap()
            .feed(&observer);
        let via_xhr = observer.slot().peek().unwrap();

        assert_eq!(via_fetch, via_xhr);
        assert_eq!(via_xhr.tile(), TileIndex::new(1023, 680));
        assert_eq!((via_xhr.pixel_x(), via_xhr.pixel_y()), (500, 12));
    }

    #[test]
    fn posted_fetch_is_not_published() {
        let matcher = PixelQueryMatcher::new(&BackendConfig::default()).unwrap();
        let observer = CoordinateObserver::new(matcher, ObservationSlot::new());
        fetch_target(text(PIXEL_URL), owned("POST"), owned("GET"))
            .unwrap()
            .feed(&observer);
        assert_eq!(observer.slot().peek(), None);
    }

    #[test]
    fn default_reinstall_interval_is_one_second() {
        assert_eq!(InterceptConfig::default().reinstall_interval_ms, 1000);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: InterceptConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, InterceptConfig::default());
        let config: InterceptConfig =
            serde_json::from_str(r#"{"reinstall_interval_ms": 250}"#).unwrap();
        assert_eq!(config.reinstall_interval_ms, 250);
    }
}

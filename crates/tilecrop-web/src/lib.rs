//! WASM entry point for tilecrop.
//!
//! The host page glue (menu buttons, map click listener, status labels)
//! constructs one [`Controller`] and forwards user actions to it:
//!
//! ```js
//! const ctl = new Controller(null);
//! selectButton.onclick = () => ctl.toggle();
//! map.on("click", async () => { await ctl.click(); render(ctl.pointLabels()); });
//! downloadButton.onclick = () => ctl.process(false);
//! newTabButton.onclick = () => ctl.process(true);
//! ```
//!
//! Construction installs the request hooks and an Escape-key listener
//! that cancels the selection. User-facing failures are reported with
//! `window.alert`; promises resolve to `true` when the action took
//! effect.

pub mod config;
pub mod messages;

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Interval;
use tilecrop_core::{
    BackendConfig, CaptureConfig, CoordinateObserver, ObservationSlot, PixelQueryMatcher,
    PointSelector, SelectionState, capture_point, stitch_png,
};
use tilecrop_io::{BrowserTimer, HttpTileSource, Interceptor, OutputMode};
use tracing::{info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::config::WebConfig;

/// Module initialisation, run once when the WASM module is instantiated.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// State shared between the controller and its pending futures.
struct Shared {
    selector: RefCell<PointSelector>,
    slot: ObservationSlot,
    backend: BackendConfig,
    capture: CaptureConfig,
}

/// Point selection and stitching, driven by the host page.
#[wasm_bindgen]
pub struct Controller {
    shared: Rc<Shared>,
    _interceptor: Rc<Interceptor>,
    _reinstall: Interval,
    escape: Closure<dyn Fn(web_sys::KeyboardEvent)>,
}

#[wasm_bindgen]
impl Controller {
    /// Create the controller and start observing the page's requests.
    ///
    /// `config_json` is an optional JSON [`WebConfig`].
    ///
    /// # Errors
    ///
    /// Throws if the config is invalid or the request hooks cannot be
    /// installed.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<Self, JsError> {
        let config = WebConfig::from_json(config_json.as_deref())?;
        tilecrop_io::init_console_logging(config.log_filter.as_deref());

        let slot = ObservationSlot::new();
        let matcher = PixelQueryMatcher::new(&config.backend)?;
        let observer = Rc::new(CoordinateObserver::new(matcher, slot.clone()));
        let interceptor = Rc::new(Interceptor::new(observer));
        let reinstall = interceptor.keep_installed(config.intercept)?;

        let shared = Rc::new(Shared {
            selector: RefCell::new(PointSelector::new()),
            slot,
            capture: config.capture(),
            backend: config.backend,
        });

        let on_escape = Rc::clone(&shared);
        let escape = Closure::<dyn Fn(web_sys::KeyboardEvent)>::new(
            move |event: web_sys::KeyboardEvent| {
                if event.key() == "Escape" {
                    on_escape.selector.borrow_mut().stop();
                }
            },
        );
        document()?
            .add_event_listener_with_callback_and_bool(
                "keydown",
                escape.as_ref().unchecked_ref(),
                true,
            )
            .map_err(|e| JsError::new(&format!("failed to listen for Escape: {e:?}")))?;

        info!(backend = %shared.backend.backend_origin, "controller ready");
        Ok(Self {
            shared,
            _interceptor: interceptor,
            _reinstall: reinstall,
            escape,
        })
    }

    /// Begin selecting points, discarding any previous selection.
    pub fn start(&self) {
        self.shared.selector.borrow_mut().start();
    }

    /// Stop selecting and clear the points.
    pub fn stop(&self) {
        self.shared.selector.borrow_mut().stop();
    }

    /// Stop if selecting, otherwise start. Returns whether selection is
    /// now active.
    pub fn toggle(&self) -> bool {
        let state = self.shared.selector.borrow_mut().toggle();
        state == SelectionState::Selecting
    }

    /// Abandon the selection, as the Escape key does.
    pub fn cancel(&self) {
        self.stop();
    }

    /// `"idle"`, `"selecting"` or `"ready"`.
    #[must_use]
    pub fn state(&self) -> String {
        self.shared.selector.borrow().state().as_str().to_owned()
    }

    /// Status line for each of the two points.
    #[wasm_bindgen(js_name = pointLabels)]
    #[must_use]
    pub fn point_labels(&self) -> js_sys::Array {
        self.shared
            .selector
            .borrow()
            .labels()
            .iter()
            .map(|label| JsValue::from_str(label))
            .collect()
    }

    /// Handle a map click: capture the coordinates the page queries next.
    ///
    /// Resolves to `true` if a point was added.
    pub fn click(&self) -> js_sys::Promise {
        let shared = Rc::clone(&self.shared);
        wasm_bindgen_futures::future_to_promise(async move {
            let outcome =
                capture_point(&shared.selector, &shared.slot, &BrowserTimer, &shared.capture)
                    .await;
            match outcome {
                Ok(_) => Ok(JsValue::TRUE),
                Err(e) => {
                    if let Some(message) = messages::capture_failure(e) {
                        alert(&message);
                    }
                    Ok(JsValue::FALSE)
                }
            }
        })
    }

    /// Stitch the selected region and download it, or show it in a new
    /// window when `open_in_new_tab` is set.
    ///
    /// Resolves to `true` if an image was delivered. A run whose selection
    /// is cancelled before it finishes is discarded.
    pub fn process(&self, open_in_new_tab: bool) -> js_sys::Promise {
        let shared = Rc::clone(&self.shared);
        let mode = OutputMode::from_new_tab(open_in_new_tab);
        wasm_bindgen_futures::future_to_promise(async move {
            let Some(selection) = shared.selector.borrow().selection() else {
                alert(messages::SELECT_TWO_POINTS);
                return Ok(JsValue::FALSE);
            };

            let source = HttpTileSource::new(shared.backend.clone());
            let encoded = match stitch_png(&source, &selection, &shared.backend).await {
                Ok(encoded) => encoded,
                Err(e) => {
                    warn!(error = %e, "stitch failed");
                    alert(&messages::stitch_failure(&e));
                    return Ok(JsValue::FALSE);
                }
            };

            if shared.selector.borrow().selection() != Some(selection) {
                info!("selection changed while stitching, discarding result");
                return Ok(JsValue::FALSE);
            }

            if let Err(e) = tilecrop_io::deliver(&encoded, mode) {
                warn!(error = %e, "failed to deliver image");
                alert(&messages::output_failure(&e));
                return Ok(JsValue::FALSE);
            }
            Ok(JsValue::TRUE)
        })
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if let Ok(document) = document() {
            let _ = document.remove_event_listener_with_callback_and_bool(
                "keydown",
                self.escape.as_ref().unchecked_ref(),
                true,
            );
        }
    }
}

fn document() -> Result<web_sys::Document, JsError> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsError::new("no document"))
}

fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(message);
    }
}

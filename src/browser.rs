use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use std::future::Future;
use wasm_bindgen::closure::{Closure, WasmClosure};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

#[rustfmt::skip]
use web_sys::{
    CanvasRenderingContext2d,
    Document,
    Element,
    HtmlCanvasElement,
    HtmlElement,
    Response,
    Window,
};

// ==================== Logging ====================
// ELI5: console_log only exists inside a browser
// - wasm32 -> console.log / console.error
// - native (cargo test) -> stderr, so core modules can log freely
#[cfg(target_arch = "wasm32")]
macro_rules! log {
    ($($t:tt)*) => {
        web_sys::console::log_1(&format!($($t)*).into())
    };
}

#[cfg(not(target_arch = "wasm32"))]
macro_rules! log {
    ($($t:tt)*) => {
        eprintln!($($t)*)
    };
}

#[cfg(target_arch = "wasm32")]
macro_rules! error {
    ($($t:tt)*) => {
        web_sys::console::error_1(&format!($($t)*).into())
    };
}

#[cfg(not(target_arch = "wasm32"))]
macro_rules! error {
    ($($t:tt)*) => {
        eprintln!("ERROR: {}", format!($($t)*))
    };
}

// ==================== Constants ====================
// Constants related to HTML elements
pub mod html {
    pub const CANVAS_ID: &str = "gameCanvas";
    pub const CONTEXT_2D: &str = "2d";
    pub const START_BUTTON_ID: &str = "startBtn";
    pub const PAUSE_BUTTON_ID: &str = "pauseBtn";
    pub const RESET_BUTTON_ID: &str = "resetBtn";
}

pub type LoopClosure = Closure<dyn FnMut(f64)>;

pub fn context() -> Result<CanvasRenderingContext2d> {
    canvas()?
        .get_context(html::CONTEXT_2D)
        // Result<Option<Object>, JsValue>
        // - map error(JsValue) to Error (anyhow)
        // - map the inner None case to an Error too
        .map_err(|js_value| anyhow!("Error getting context : {:#?}", js_value))?
        .ok_or_else(|| anyhow!("No 2d context found"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|element| {
            anyhow!(
                "Error converting {:#?} to CanvasRenderingContext2d",
                element
            )
        })
}

pub fn canvas() -> Result<HtmlCanvasElement> {
    document()?
        .get_element_by_id(html::CANVAS_ID)
        .ok_or_else(|| anyhow!("No Canvas Element found with ID : '{:#?}'", html::CANVAS_ID))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlCanvasElement", element))
}

pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("Window not found"))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| anyhow!("No Document Found"))
}

pub fn element_by_id(id: &str) -> Result<Element> {
    document()?
        .get_element_by_id(id)
        .ok_or_else(|| anyhow!("No Element found with ID : '{}'", id))
}

pub fn html_element_by_id(id: &str) -> Result<HtmlElement> {
    element_by_id(id)?
        .dyn_into::<HtmlElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlElement", element))
}

/// Canvas width available inside the canvas' parent, minus its padding.
pub fn container_width(padding: f64) -> Result<f64> {
    let parent = canvas()?
        .parent_element()
        .ok_or_else(|| anyhow!("Canvas has no parent element"))?;
    Ok(f64::from(parent.client_width()) - padding)
}

pub fn viewport_width() -> Result<f64> {
    window()?
        .inner_width()
        .map_err(|err| anyhow!("Could not read window.innerWidth : {:#?}", err))?
        .as_f64()
        .ok_or_else(|| anyhow!("window.innerWidth is not a number"))
}

/// Resize the drawing buffer and the css box together so click coordinates
/// map 1:1 onto canvas pixels.
pub fn resize_canvas(width: f64, height: f64) -> Result<()> {
    let canvas = canvas()?;
    canvas.set_width(width as u32);
    canvas.set_height(height as u32);
    let style = canvas.style();
    style
        .set_property("width", &format!("{}px", width))
        .map_err(|err| anyhow!("Could not set canvas width style : {:#?}", err))?;
    style
        .set_property("height", &format!("{}px", height))
        .map_err(|err| anyhow!("Could not set canvas height style : {:#?}", err))
}

/// Performance clock, used for frame pacing only.
pub fn now() -> Result<f64> {
    Ok(window()?
        .performance()
        .ok_or_else(|| anyhow!("Performance object not found"))?
        .now())
}

/// Wall clock in milliseconds, used for round timing and the game record.
pub fn wall_clock() -> f64 {
    js_sys::Date::now()
}

pub fn closure_wrap<T: WasmClosure + ?Sized>(data: Box<T>) -> Closure<T> {
    Closure::wrap(data)
}

pub fn create_raf_closure(f: impl FnMut(f64) + 'static) -> LoopClosure {
    closure_wrap(Box::new(f))
}

pub fn request_animation_frame(callback: &LoopClosure) -> Result<i32> {
    window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Cannot request animation frame {:#?}", err))
}

pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

pub async fn fetch_json<T>(json_path: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let resp_value = fetch_with_str(json_path).await?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|element| anyhow!("error converting [{:#?}] to Response", element))?;
    if !resp.ok() {
        return Err(anyhow!(
            "fetching [{}] returned status {}",
            json_path,
            resp.status()
        ));
    }
    let json = resp
        .json()
        .map_err(|err| anyhow!("Could not get JSON from response [{:#?}]", err))?;

    let json_value = JsFuture::from(json)
        .await
        .map_err(|err| anyhow!("error fetching [{:#?}]", err))?;

    serde_wasm_bindgen::from_value(json_value)
        .map_err(|err| anyhow!("error converting response : {:#?}", err))
}

async fn fetch_with_str(resource: &str) -> Result<JsValue> {
    let resp = window()?.fetch_with_str(resource);

    JsFuture::from(resp)
        .await
        .map_err(|err| anyhow!("error fetching : {:#?}", err))
}

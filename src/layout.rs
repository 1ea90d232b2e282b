//! Layout Provider: picks canvas dimensions for the page width.

use crate::browser;
use crate::engine::Size;
use anyhow::Result;

/// Horizontal padding of the canvas container.
pub const CONTAINER_PADDING: f64 = 40.0;

/// ┌──────────── Breakpoints ───────────────────────────────┐
/// │ viewport > 768  │ w = min(700, container) h = w * 0.571 ≤ 400 │
/// │ viewport ≤ 768  │ w = min(400, container) h = w * 0.75  ≤ 300 │
/// │ viewport ≤ 480  │ w = min(350, container) h = w * 0.714 ≤ 250 │
/// └─────────────────────────────────────────────────────────┘
pub fn canvas_size(container_width: f64, viewport_width: f64) -> Size {
    let container_width = container_width.max(0.0);
    let (max_width, ratio, max_height) = if viewport_width <= 480.0 {
        (350.0, 0.714, 250.0)
    } else if viewport_width <= 768.0 {
        (400.0, 0.75, 300.0)
    } else {
        (700.0, 0.571, 400.0)
    };
    let width = container_width.min(max_width);
    Size {
        width,
        height: (width * ratio).min(max_height),
    }
}

/// Measure the page, resize the canvas and report the new size.
pub fn fit_canvas() -> Result<Size> {
    let size = canvas_size(
        browser::container_width(CONTAINER_PADDING)?,
        browser::viewport_width()?,
    );
    browser::resize_canvas(size.width.floor(), size.height.floor())?;
    Ok(Size {
        width: size.width.floor(),
        height: size.height.floor(),
    })
}

// ==================== Imports ====================
use wasm_bindgen::prelude::*;

#[macro_use]
mod browser;
pub mod config;
pub mod display;
pub mod engine;
pub mod feedback;
pub mod game;
pub mod grid;
pub mod hit;
pub mod layout;
pub mod round;
pub mod session;
pub mod spawner;
pub mod timer;

// TABLE:
// ┌──────────────────────────────────────────────────────────────────────────┐
// │                        Module Map                                        │
// ├───────────────────┬──────────────────────────────────────────────────────┤
// │ browser / engine  │ web_sys plumbing, game loop, input, canvas drawing   │
// │ game              │ CrocodileGame: input -> Round -> panel / audio       │
// │ round             │ Round: the one owner of all game state               │
// │ ├── session       │ score, coins, countdown, phase                       │
// │ ├── grid          │ cells and who sits on them                           │
// │ ├── spawner       │ crocodiles and their dwell                           │
// │ ├── timer         │ cancellable tasks: countdown, spawn, expiry          │
// │ └── hit           │ click -> crocodile                                   │
// │ display / feedback│ score panel, sound cues and background music         │
// │ config / layout   │ tunables and canvas sizing                           │
// └───────────────────┴──────────────────────────────────────────────────────┘

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - installs the panic hook
/// - starts the game loop on the page's canvas
/// - swaps the game area for a notice if that fails
#[wasm_bindgen(start)]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    // spawns a new asynchronous task in local thread, for web assembly
    // environment, using wasm_bindgen_futures
    browser::spawn_local(async move {
        let game = game::CrocodileGame::new();
        if let Err(err) = engine::GameLoop::start(game).await {
            error!("Could not start game loop : {:#}", err);
            if let Err(err) = display::show_load_failure() {
                error!("Could not show the failure notice : {:#}", err);
            }
        }
    });

    Ok(())
}

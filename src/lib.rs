// Exposes the game core to the integration tests in tests/.
// Terminal drawing and the event loop stay in the binary.
pub mod app_dirs;
pub mod celebration;
pub mod clock;
pub mod config;
pub mod feedback;
pub mod game;
pub mod highscore;
pub mod history;
pub mod phrases;
pub mod runtime;
pub mod thought;
pub mod util;

pub mod lyrics;
pub mod music;
pub mod root;
pub use lyrics::lyrics_routes;
pub use music::music_routes;
pub use root::{docs_route, health_check_route, root_route};

pub mod lyrics;
pub mod music;
pub mod parser;
pub mod recommender;
pub mod root;
pub use root::RootController;

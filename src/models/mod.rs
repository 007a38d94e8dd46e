pub mod lyrics;
pub mod track;

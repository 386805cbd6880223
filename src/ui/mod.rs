pub mod export;
pub mod panels;
pub mod plot;
pub mod table;

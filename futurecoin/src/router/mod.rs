pub mod download;
pub mod history;
pub mod predict;
pub mod quotes;
pub mod rates;

pub mod util;

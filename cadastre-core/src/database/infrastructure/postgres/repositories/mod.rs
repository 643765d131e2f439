pub mod results;
pub mod territory;

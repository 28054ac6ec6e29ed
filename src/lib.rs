pub mod bigraph;
pub mod effects;
pub mod location;
pub mod runners;

pub mod bates;
pub mod contour;
pub mod grain;
pub mod regression;
pub mod segment;
pub mod shapes;
pub mod solid;

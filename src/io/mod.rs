pub mod gl;
pub mod params;

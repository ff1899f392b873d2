pub mod axes;
pub mod bounds;
pub mod vertices;

pub use bounds::Bounds;
pub use vertices::Vertex;

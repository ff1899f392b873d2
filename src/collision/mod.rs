pub mod contact;
pub mod detector;
pub mod pair;
pub mod pairs;
pub mod resolver;
pub mod sat;

// Re-export key types
pub use contact::Contact;
pub use detector::Detector;
pub use pair::{Pair, PairId};
pub use pairs::Pairs;
pub use sat::{collides, Collision, PartRef, Support};

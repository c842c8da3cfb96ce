pub mod graph;
pub mod node;
pub mod shapes;
pub mod text;
pub mod traverse;

pub use graph::{Listener, Scene, SubscriptionId};
pub use node::{Entity, Node, NodeId, NodeKind, Paint, Property, ScheduledFn};
pub use shapes::{Circle, Collider, ImageShape, PathShape, Polygon, UNIT_SQUARE, test_edge};
pub use text::{HorizontalAlignment, LINE_HEIGHT, Overflow, TextLine, TextShape, layout_lines};
pub use traverse::CollisionProbe;

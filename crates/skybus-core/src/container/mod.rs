//! Small containers used to wire the middleware together.
//!
//! All of them are built during initialization and hold their contents for
//! the life of the process; none of them allocate on the message path.

mod circular_list;
mod fixed_ordered_map;
mod linked_list;
mod registry;

pub use circular_list::CircularList;
pub use fixed_ordered_map::{FixedOrderedMap, MapEntry};
pub use linked_list::LinkedList;
pub use registry::{RegistrationId, Registry};

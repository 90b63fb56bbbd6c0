//! # State
//!
//! Everything that makes up an editing session: the layers, their placement, and the
//! surrounding session settings.

pub mod layer;
pub mod mockup;
pub mod session;
pub mod store;
pub mod transform;

pub use layer::{Layer, LayerID, LayerKind, PartialPlacement, Placement};
pub use mockup::{MockupAsset, Side};
pub use session::{EditorSession, Tool};
pub use store::{Change, LayerStore, Restack};

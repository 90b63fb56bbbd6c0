pub mod color;
pub mod error;
pub mod id;
pub mod ingest;
pub mod options;
pub mod state;
pub mod units;
pub mod util;

use id::DarkroomID;

pub use error::{EditorError, ErrorKind};

//! Item catalog and name resolution.
//!
//! OCR output is noisy; everything in here exists to turn it back into a
//! canonical catalog name, with a flag when the answer is shaky.

mod distance;
pub use distance::*;
mod id;
pub use id::*;
mod korean;
pub use korean::korean_distance;
mod resolver;
pub use resolver::*;
mod structs;
pub use structs::*;

pub use course::*;
pub use snapshot::*;
pub use timestamp::*;
pub use user::*;

mod course;
mod snapshot;
mod timestamp;
mod user;

pub mod profile;
pub mod source;
pub mod submission;
pub mod transcript;

pub use profile::*;
pub use source::*;
pub use submission::*;
pub use transcript::*;

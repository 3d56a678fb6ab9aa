pub mod media;
pub mod record;

pub use media::*;
pub use record::*;

pub mod dump;
pub mod intake;

pub use intake::intake;

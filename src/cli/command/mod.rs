pub mod dates;
pub mod download;

pub use dates::dates;
pub use download::download;

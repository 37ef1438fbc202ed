pub mod cli;
pub mod codon;
pub mod combine;
pub mod consts;
pub mod database;
pub mod error;
pub mod header;
pub mod ions;
pub mod mapper;
pub mod partition;
pub mod stats;
pub mod tables;
pub mod utils;

pub use error::{ErrorKind, MappingError, RecodonError, Result};

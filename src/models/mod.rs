pub mod metadata;

pub use metadata::{Metadata, OpenGraph, TwitterCard};

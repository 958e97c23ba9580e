// Input adapters: turn the bytes of a transcript file into page texts.

pub mod source;

pub use source::read_pages;

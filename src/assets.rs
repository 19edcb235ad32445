//! Image sources: decoding, dimension probing, template catalogs and pickers.

pub(crate) mod catalog;
pub(crate) mod decode;
pub(crate) mod picker;

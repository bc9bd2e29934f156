//! Cross-module pipeline tests and the fakes they share.

pub(crate) mod fakes;

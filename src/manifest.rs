pub(crate) mod decompose;

pub(crate) mod kernel;

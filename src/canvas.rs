pub(crate) mod channel_canvas;
pub(crate) mod flatten;

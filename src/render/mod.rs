pub(crate) mod backend;
pub(crate) mod cpu;
pub(crate) mod deform;
pub(crate) mod layout;
pub(crate) mod pipeline;
pub(crate) mod state;
pub(crate) mod texture;

pub(crate) mod model;
pub(crate) mod parser;
pub(crate) mod tags;
pub(crate) mod time;

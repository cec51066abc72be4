mod bootstrap;
mod runner;
mod terminal;

pub(crate) use bootstrap::{build_app, init_tracing};
pub(crate) use runner::run;

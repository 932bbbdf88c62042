mod config;
mod discovery;
mod probe;
mod remote;

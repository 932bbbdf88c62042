mod config;
mod connection;
mod discovery;
mod fake_operator;
mod remote;

mod declaration;
mod module;
mod operator_process;
mod state;

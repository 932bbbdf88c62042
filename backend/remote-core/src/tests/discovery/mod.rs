mod launch;
mod process;

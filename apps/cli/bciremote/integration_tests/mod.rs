mod operator_stub;
mod session;

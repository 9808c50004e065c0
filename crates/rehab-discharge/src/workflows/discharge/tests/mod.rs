mod common;
mod worker;

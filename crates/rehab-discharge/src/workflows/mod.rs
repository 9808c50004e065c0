pub mod discharge;

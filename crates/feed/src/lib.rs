pub mod kite;

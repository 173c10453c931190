pub mod barcode;
pub mod facts;

pub use barcode::{Barcode, InvalidBarcode};
pub use facts::{Nutrients, ProductFacts};

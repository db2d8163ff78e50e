// Adapters layer: concrete host models, key inventories and report output.

pub mod key_inventory;
pub mod memory;
pub mod report_writer;

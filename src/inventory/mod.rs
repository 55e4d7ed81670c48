//! Building the technology, intervention and impact matrices of a product system.
pub mod allocation;
pub mod builder;
pub mod cells;
pub mod chain;
pub mod data;
pub mod impact;

pub use builder::InventoryBuilder;
pub use cells::{CellGroup, CellTable, ExchangeCell};
pub use chain::SupplyChain;
pub use data::{MatrixCells, MatrixData};
pub use impact::{impact_cells, NwTable};

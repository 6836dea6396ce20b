//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod batch;
pub mod inventory;
pub mod invoice;
pub mod medicine;
pub mod movement;
pub mod order;
pub mod order_item;
pub mod party;
pub mod recall;
pub mod sales_record;
pub mod shipment;
pub mod shipment_item;
pub mod unit;
pub mod unit_transfer;

// Re-export specific types to avoid conflicts
pub use batch::{Column as BatchColumn, Entity as Batch, Model as BatchModel};
pub use inventory::{Column as InventoryColumn, Entity as Inventory, Model as InventoryModel};
pub use invoice::{Column as InvoiceColumn, Entity as Invoice, Model as InvoiceModel};
pub use medicine::{Column as MedicineColumn, Entity as Medicine, Model as MedicineModel};
pub use movement::{Column as MovementColumn, Entity as Movement, Model as MovementModel};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use order_item::{Column as OrderItemColumn, Entity as OrderItem, Model as OrderItemModel};
pub use party::{Column as PartyColumn, Entity as Party, Model as PartyModel};
pub use recall::{Column as RecallColumn, Entity as Recall, Model as RecallModel};
pub use sales_record::{
    Column as SalesRecordColumn, Entity as SalesRecord, Model as SalesRecordModel,
};
pub use shipment::{Column as ShipmentColumn, Entity as Shipment, Model as ShipmentModel};
pub use shipment_item::{
    Column as ShipmentItemColumn, Entity as ShipmentItem, Model as ShipmentItemModel,
};
pub use unit::{Column as UnitColumn, Entity as Unit, Model as UnitModel};
pub use unit_transfer::{
    Column as UnitTransferColumn, Entity as UnitTransfer, Model as UnitTransferModel,
};

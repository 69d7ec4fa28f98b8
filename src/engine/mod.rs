// Game core: catalog, ledger, inventory, garden beds and the action dispatcher.

pub mod action;
pub mod catalog;
pub mod garden;
pub mod inventory;
pub mod ledger;
pub mod leveling;
pub mod service;

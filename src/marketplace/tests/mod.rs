mod common;

mod catalog;
mod ledger;

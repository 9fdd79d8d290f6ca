pub mod removal;

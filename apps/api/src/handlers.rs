pub mod audit;
pub mod directory;
pub mod health;
pub mod permissions;

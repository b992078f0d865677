pub mod accounts;
pub mod audit;
pub mod comments;
pub mod reports;
pub mod skills;

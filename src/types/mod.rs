pub mod account;
pub mod grade;
pub mod pagination;
pub mod question;
pub mod subject;
pub mod tag;

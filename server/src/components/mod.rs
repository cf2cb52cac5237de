pub mod form;
pub mod layout;
pub mod sections;
pub mod ui;

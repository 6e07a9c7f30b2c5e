mod form;
mod pages;
mod producer;

pub use form::CounterField;
pub use pages::{hello, root};
pub use producer::produce;

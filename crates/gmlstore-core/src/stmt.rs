mod row;
pub use row::Row;

mod value;
pub use value::Value;

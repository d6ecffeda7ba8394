mod record;

pub use record::Record;
pub use ulid::Ulid;

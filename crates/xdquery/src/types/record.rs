use derive_more::Display;
use ulid::Ulid;

///
/// Record
///
/// Opaque, identity-bearing handle to one stored item.
/// Carries no query logic; equality and ordering are by identity only.
/// Stores hand out identities in creation order, so the natural ordering
/// doubles as index order.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("{_0}")]
pub struct Record(Ulid);

impl Record {
    #[must_use]
    pub const fn new(id: Ulid) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn from_u128(raw: u128) -> Self {
        Self(Ulid(raw))
    }

    #[must_use]
    pub const fn id(self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for Record {
    fn from(id: Ulid) -> Self {
        Self(id)
    }
}

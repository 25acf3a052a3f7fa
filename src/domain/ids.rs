use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identity of a borrowing SME.
    SmeId(u32)
);
id_type!(
    /// Identity of an invoice owned by an SME.
    InvoiceId(u32)
);
id_type!(
    /// Identity of a lender reviewing requests.
    LenderId(u32)
);
id_type!(
    /// Identity of a finance request. Assigned by the store in increasing order.
    RequestId(u64)
);
id_type!(
    /// Identity of a recorded credit score snapshot.
    ScoreId(u64)
);

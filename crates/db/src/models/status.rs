//! Status helper enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table, and each variant's
//! name string matches the seeded `name` column.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr => $label:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Resolve a database status ID back to the enum.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// The seeded `name` column value.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $label ),+
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Path enrollment lifecycle status.
    PathEnrollmentStatus {
        Active = 1 => "active",
        Completed = 2 => "completed",
        Dropped = 3 => "dropped",
    }
}

define_status_enum! {
    /// Per-course progress state within a path enrollment.
    CourseProgressStatus {
        Locked = 1 => "locked",
        Available = 2 => "available",
        InProgress = 3 => "in_progress",
        Completed = 4 => "completed",
    }
}

define_status_enum! {
    /// Course enrollment lifecycle status (the external collaborator's).
    CourseEnrollmentStatus {
        Active = 1 => "active",
        Completed = 2 => "completed",
        Dropped = 3 => "dropped",
    }
}

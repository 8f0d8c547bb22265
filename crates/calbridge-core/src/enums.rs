//! String enumerations exchanged with the bridge and the integer constants the
//! calendar provider stores for them.

use serde::{Deserialize, Serialize};

macro_rules! platform_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident = $value:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Integer stored by the calendar provider.
            pub fn to_platform(self) -> i64 {
                match self {
                    $($name::$variant => $value),+
                }
            }

            pub fn from_platform(value: i64) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.to_platform() == value)
            }
        }

        serde_plain::derive_display_from_serialize!($name);
        serde_plain::derive_fromstr_from_deserialize!($name);
    };
}

platform_enum! {
    pub enum EventAvailability {
        Busy = 0,
        Free = 1,
        Tentative = 2,
    }
}

platform_enum! {
    pub enum EventStatus {
        Tentative = 0,
        Confirmed = 1,
        Canceled = 2,
    }
}

platform_enum! {
    pub enum EventAccessLevel {
        Default = 0,
        Confidential = 1,
        Private = 2,
        Public = 3,
    }
}

platform_enum! {
    pub enum AttendeeRole {
        None = 0,
        Attendee = 1,
        Organizer = 2,
        Performer = 3,
        Speaker = 4,
    }
}

platform_enum! {
    pub enum AttendeeStatus {
        None = 0,
        Accepted = 1,
        Declined = 2,
        Invited = 3,
        Tentative = 4,
    }
}

platform_enum! {
    pub enum AttendeeType {
        None = 0,
        Required = 1,
        Optional = 2,
        Resource = 3,
    }
}

platform_enum! {
    /// Reminder delivery method.
    pub enum AlarmMethod {
        Default = 0,
        Alert = 1,
        Email = 2,
        Sms = 3,
        Alarm = 4,
    }
}

platform_enum! {
    pub enum CalendarAccessLevel {
        None = 0,
        FreeBusy = 100,
        Read = 200,
        Respond = 300,
        Override = 400,
        Contributor = 500,
        Editor = 600,
        Owner = 700,
        Root = 800,
    }
}

impl CalendarAccessLevel {
    pub fn allows_modifications(self) -> bool {
        matches!(
            self,
            CalendarAccessLevel::Contributor
                | CalendarAccessLevel::Editor
                | CalendarAccessLevel::Owner
                | CalendarAccessLevel::Root
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarEntity {
    Event,
    Reminder,
}

//! Typed vocabularies for the string columns stored in the database.
//!
//! Entities keep these as plain `String` columns; the enums here are the
//! only place their spellings live.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The spelling stored in the database.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(Error::Validation {
                        message: format!("unknown {} '{other}'", stringify!($name)),
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// Account role. Guardians approve and manage; children earn and spend.
    Role {
        /// Parent account
        Guardian => "guardian",
        /// Explorer account
        Child => "child",
    }
}

string_enum! {
    /// Avatar gender used for display only.
    Gender {
        /// Boy avatars
        Boy => "boy",
        /// Girl avatars
        Girl => "girl",
    }
}

string_enum! {
    /// Where a quest sits in its lifecycle.
    TaskStatus {
        /// Available to the child
        Pending => "pending",
        /// Child says it is done, waiting for a guardian
        Completed => "completed",
        /// Guardian accepted it
        Approved => "approved",
    }
}

string_enum! {
    /// Quest categories shown on the dashboards.
    TaskCategory {
        /// School work
        Homework => "Homework",
        /// Household chores
        Chores => "Chores",
        /// Exercise and sport
        Physical => "Physical",
        /// Drawing, music, crafts
        Creative => "Creative",
        /// Reading and calm activities
        QuietTime => "Quiet Time",
        /// Recurring hygiene and routine habits
        DailyHabit => "Daily Habit",
        /// Puzzles and learning games
        BrainPower => "Brain Power",
        /// Focus sessions
        ZenMode => "Zen Mode",
    }
}

string_enum! {
    /// Kind of catalog entry.
    RewardType {
        /// System-granted achievement
        Badge => "badge",
        /// Guardian-created voucher ("30 min screen time")
        Voucher => "voucher",
        /// Guardian-created item
        Item => "item",
    }
}

string_enum! {
    /// What caused a gem movement.
    TransactionType {
        /// Approved quest
        Task => "task",
        /// Daily check-in
        Streak => "streak",
        /// Manual guardian adjustment
        Bonus => "bonus",
        /// Reward purchase
        Reward => "reward",
    }
}

string_enum! {
    /// Friend request state. Resolved requests keep their terminal state.
    FriendRequestStatus {
        /// Awaiting the recipient
        Pending => "pending",
        /// Recipient accepted; friendship exists both ways
        Accepted => "accepted",
        /// Recipient dismissed it
        Ignored => "ignored",
    }
}

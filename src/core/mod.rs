/// Achievement badges granted from the gem balance
pub mod badge;

/// Adjustments, purchases and daily check-ins
pub mod economy;

/// Profile reads, display edits and the XP/level rule
pub mod profile;

/// Guardian-managed reward catalog
pub mod reward;

/// Friend requests, friend lists and profile visibility
pub mod social;

/// Quest lifecycle and the daily reset
pub mod task;

/// Append-only gem transaction log
pub mod transaction;

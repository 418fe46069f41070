pub mod eligibility;
pub mod formatters;
pub mod handlers;
pub mod manager;
pub mod models;
pub mod notifier;
pub mod registry;
pub mod scheduler;
pub mod strategies;
pub mod utils;

pub use crate::commands::giveaway::handlers::{
    // Giveaway management
    create_giveaway,
    end_giveaway,
    giveaways,

    // Interaction with the giveaway
    join,
    reroll,
};

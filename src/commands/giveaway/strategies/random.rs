use rand::seq::SliceRandom;

use serenity::model::id::UserId;

use crate::commands::giveaway::strategies::base::{DrawOptions, WinnerStrategy};

// Uniform draw without replacement. A forced winner short-circuits the
// draw and is returned as the sole winner, whether or not that user ever
// registered.
#[derive(Debug)]
pub struct UniformDrawStrategy;

impl UniformDrawStrategy {
    pub fn new() -> Self {
        UniformDrawStrategy {}
    }
}

impl WinnerStrategy for UniformDrawStrategy {
    fn roll(&self, options: &DrawOptions) -> Vec<UserId> {
        if let Some(forced) = options.forced() {
            return vec![forced];
        }

        let mut pool = options.entries().to_vec();
        let amount = options.count().min(pool.len());
        let mut rng = rand::rng();
        let (drawn, _rest) = pool.partial_shuffle(&mut rng, amount);
        drawn.to_vec()
    }
}

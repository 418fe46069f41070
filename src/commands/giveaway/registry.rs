use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::commands::giveaway::models::Giveaway;
use crate::error::{Error, Result};

// Owns the giveaway records. Each record carries its own synchronization,
// so the registry only needs a concurrent map keyed by id plus a
// secondary index for the human-facing codes. Ended giveaways are kept
// around so that rerolls stay possible.
#[derive(Debug)]
#[non_exhaustive]
pub struct GiveawayRegistry {
    giveaways: DashMap<Uuid, Arc<Giveaway>>,
    codes: DashMap<String, Uuid>,
}

impl GiveawayRegistry {
    pub fn new() -> Self {
        GiveawayRegistry {
            giveaways: DashMap::new(),
            codes: DashMap::new(),
        }
    }

    pub fn add(&self, giveaway: Arc<Giveaway>) {
        self.codes
            .insert(giveaway.code().to_owned(), giveaway.id());
        self.giveaways.insert(giveaway.id(), giveaway);
    }

    pub fn get(&self, id: Uuid) -> Result<Arc<Giveaway>> {
        match self.giveaways.get(&id) {
            Some(pair) => Ok(pair.value().clone()),
            None => Err(Error::NotFound),
        }
    }

    pub fn get_by_code(&self, code: &str) -> Result<Arc<Giveaway>> {
        let normalized_code = code.trim().to_uppercase();
        match self.codes.get(&normalized_code) {
            Some(pair) => self.get(*pair.value()),
            None => Err(Error::NotFound),
        }
    }

    pub fn get_giveaways(&self) -> Vec<Arc<Giveaway>> {
        self.giveaways
            .iter()
            .map(|pair| pair.value().clone())
            .collect()
    }
}

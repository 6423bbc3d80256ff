use crate::domain::charge::{Charge, ChargeId, Route, valid_routes};
use crate::domain::customer::Role;
use crate::domain::money::MinorUnits;
use crate::domain::movement::MovementKind;
use crate::domain::ports::ChargeStoreRef;
use crate::error::{LedgerError, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Owns the fee schedule, one charge per valid route.
pub struct TariffManager {
    charges: ChargeStoreRef,
}

impl TariffManager {
    pub fn new(charges: ChargeStoreRef) -> Self {
        Self { charges }
    }

    /// Seeds the default schedule in the background.
    ///
    /// Fee lookups issued before seeding finishes may fail with `ChargeNotSet`.
    pub fn spawn_seeding(self: &Arc<Self>) -> JoinHandle<()> {
        let tariff = Arc::clone(self);
        tokio::spawn(async move {
            match tariff.seed().await {
                Ok(created) => info!(created, "tariff seeded"),
                Err(e) => error!(error = %e, "failed to seed tariff"),
            }
        })
    }

    /// Inserts a zero fee for every valid route that has no charge yet.
    ///
    /// Returns how many charges were created; running it twice creates none.
    pub async fn seed(&self) -> Result<usize> {
        let mut created = 0;
        for route in valid_routes() {
            match self.charges.add(Charge::new(route, MinorUnits::ZERO)).await {
                Ok(_) => created += 1,
                Err(LedgerError::ChargeExists(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(created)
    }

    /// Fee in minor units for a movement along the given route.
    pub async fn get_charge(
        &self,
        operation: MovementKind,
        source: Role,
        destination: Role,
    ) -> Result<MinorUnits> {
        let charge = self
            .charge_for(Route::new(operation, source, destination))
            .await?;
        Ok(charge.fee)
    }

    pub async fn charge_for(&self, route: Route) -> Result<Charge> {
        self.charges
            .find_by_route(route)
            .await?
            .ok_or(LedgerError::ChargeNotSet(route))
    }

    /// All charges ordered by route; empty before seeding.
    pub async fn get_tariff(&self) -> Result<Vec<Charge>> {
        let mut charges = self.charges.all_charges().await?;
        charges.sort_by_key(|charge| charge.route);
        Ok(charges)
    }

    /// Replaces the fee of an existing charge.
    pub async fn update_charge(&self, id: ChargeId, fee: MinorUnits) -> Result<Charge> {
        if fee.is_negative() {
            return Err(LedgerError::InvalidAmount(format!(
                "fee {fee} must not be negative"
            )));
        }
        let mut charge = self
            .charges
            .find_by_id(id)
            .await?
            .ok_or(LedgerError::ChargeNotFound(id))?;
        charge.fee = fee;
        self.charges.update(charge.clone()).await?;
        info!(route = %charge.route, %fee, "charge updated");
        Ok(charge)
    }
}

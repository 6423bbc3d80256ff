use crate::domain::customer::Role;
use crate::domain::money::MinorUnits;
use crate::domain::movement::MovementKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChargeId(pub Uuid);

impl ChargeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChargeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChargeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of a tariff entry: at most one fee exists per route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Route {
    pub operation: MovementKind,
    pub source: Role,
    pub destination: Role,
}

impl Route {
    pub const fn new(operation: MovementKind, source: Role, destination: Role) -> Self {
        Self {
            operation,
            source,
            destination,
        }
    }

    /// Stable textual key, used by storage adapters to enforce route uniqueness.
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.operation, self.source, self.destination)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} from {} to {}",
            self.operation, self.source, self.destination
        )
    }
}

/// Withdrawals always happen at an agent's desk.
pub const WITHDRAW_ROUTES: [Route; 3] = [
    Route::new(MovementKind::Withdraw, Role::Subscriber, Role::Agent),
    Route::new(MovementKind::Withdraw, Role::Merchant, Role::Agent),
    Route::new(MovementKind::Withdraw, Role::Agent, Role::Agent),
];

pub const TRANSFER_ROUTES: [Route; 5] = [
    Route::new(MovementKind::Transfer, Role::Agent, Role::Agent),
    Route::new(MovementKind::Transfer, Role::Subscriber, Role::Subscriber),
    Route::new(MovementKind::Transfer, Role::Merchant, Role::Subscriber),
    // payments
    Route::new(MovementKind::Transfer, Role::Subscriber, Role::Merchant),
    Route::new(MovementKind::Transfer, Role::Agent, Role::Merchant),
];

/// Every route the tariff knows about; deposits carry no fee and have none.
pub fn valid_routes() -> impl Iterator<Item = Route> {
    WITHDRAW_ROUTES.into_iter().chain(TRANSFER_ROUTES)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charge {
    pub id: ChargeId,
    pub route: Route,
    /// Fee in minor units, charged to the payer.
    pub fee: MinorUnits,
}

impl Charge {
    pub fn new(route: Route, fee: MinorUnits) -> Self {
        Self {
            id: ChargeId::new(),
            route,
            fee,
        }
    }
}

//! In-memory order registry.
//!
//! Holds every order submitted since the process started:
//! - keyed by server-assigned [`OrderId`] (dense, starting at 0),
//! - and by client [`Token`] for cancel lookup.
//!
//! Tokens are not required to be unique. When a token is reused, the
//! token index points at the most recent order registered under it.
//!
//! The registry is owned by a single task and is never shared, so it has
//! no interior locking.

use std::collections::HashMap;

use tracing::debug;

use crate::alpha::Token;
use crate::error::RegistryError;
use crate::messages::NewOrder;
use crate::order::{Order, OrderId, OrderState};

/// Admission checks applied by [`OrderRegistry::register`].
///
/// Every limit is off by default, which accepts any order with a valid
/// side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryLimits {
    /// Maximum number of orders held, across all states.
    pub max_orders: Option<usize>,

    /// Maximum quantity of a single order.
    pub max_order_qty: Option<u32>,

    /// Reject a new order whose token maps to an order that is still live.
    pub reject_duplicate_tokens: bool,
}

/// Order table keyed by identifier and by token.
#[derive(Debug, Default)]
pub struct OrderRegistry {
    /// Indexed by `OrderId.0`.
    orders: Vec<Order>,

    /// Most recent order per token.
    by_token: HashMap<Token, OrderId>,

    limits: RegistryLimits,
}

impl OrderRegistry {
    /// Create an empty registry with no admission limits.
    pub fn new() -> Self {
        OrderRegistry::default()
    }

    pub fn with_limits(limits: RegistryLimits) -> Self {
        OrderRegistry {
            limits,
            ..OrderRegistry::default()
        }
    }

    pub fn limits(&self) -> &RegistryLimits {
        &self.limits
    }

    /// Register a new order and return its identifier.
    ///
    /// The order is stored in state `New`. On failure nothing is stored
    /// and no identifier is consumed.
    pub fn register(&mut self, msg: &NewOrder) -> Result<OrderId, RegistryError> {
        let side = msg.side().ok_or(RegistryError::InvalidSide(msg.side))?;
        self.check_limits(msg)?;

        let id = u64::try_from(self.orders.len())
            .map(OrderId)
            .map_err(|_| RegistryError::IdsExhausted)?;

        self.orders.push(Order::from_new_order(id, side, msg));
        self.by_token.insert(msg.token, id);

        debug!(order_id = %id, token = %msg.token, side = %side, qty = msg.qty, "registered order");
        Ok(id)
    }

    /// Resolve a token to the most recent order registered under it.
    pub fn find(&self, token: &Token) -> Option<OrderId> {
        self.by_token.get(token).copied()
    }

    /// Move an order to `Canceled`.
    ///
    /// Only `New` and `Open` orders can be canceled. Anything else,
    /// including an unknown identifier, leaves the registry unchanged.
    pub fn cancel(&mut self, id: OrderId) -> Result<(), RegistryError> {
        let order = self
            .get_mut(id)
            .ok_or(RegistryError::UnknownOrder(id))?;

        if !order.state.is_cancelable() {
            return Err(RegistryError::NotCancelable {
                id,
                state: order.state,
            });
        }

        order.state = OrderState::Canceled;
        debug!(order_id = %id, token = %order.token, "canceled order");
        Ok(())
    }

    pub fn get(&self, id: OrderId) -> Option<&Order> {
        usize::try_from(id.0).ok().and_then(|i| self.orders.get(i))
    }

    fn get_mut(&mut self, id: OrderId) -> Option<&mut Order> {
        usize::try_from(id.0).ok().and_then(|i| self.orders.get_mut(i))
    }

    /// Number of orders ever registered.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// All orders in identifier order.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    fn check_limits(&self, msg: &NewOrder) -> Result<(), RegistryError> {
        if let Some(max) = self.limits.max_orders {
            if self.orders.len() >= max {
                return Err(RegistryError::CapacityReached(max));
            }
        }

        if let Some(max) = self.limits.max_order_qty {
            if msg.qty > max {
                return Err(RegistryError::QuantityTooLarge { qty: msg.qty, max });
            }
        }

        if self.limits.reject_duplicate_tokens {
            let live = self
                .find(&msg.token)
                .and_then(|id| self.get(id))
                .is_some_and(|o| o.state.is_cancelable());
            if live {
                return Err(RegistryError::DuplicateToken(msg.token.to_string()));
            }
        }

        Ok(())
    }
}

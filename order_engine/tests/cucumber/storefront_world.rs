use std::collections::HashMap;

use cucumber::World;
use log::*;
use order_engine::{
    db_types::OrderId,
    events::EventProducers,
    test_utils::{fake_gateway::FakeCheckoutGateway, prepare_env::new_test_database, seed::seed_storefront},
    OrderFlowApi,
    OrderQueryApi,
    PaymentGatewayDatabase,
    PaymentReconciler,
    PricingPolicy,
    ReconcileOutcome,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct StorefrontWorld {
    pub system: Option<OrderManagementSystem>,
    /// Scenario labels for orders, mapped to the ids the engine generated
    pub orders: HashMap<String, OrderId>,
    pub last_error: Option<String>,
    pub last_outcome: Option<ReconcileOutcome>,
}

#[derive(Debug)]
pub struct OrderManagementSystem {
    pub db: SqliteDatabase,
    pub gateway: FakeCheckoutGateway,
    pub flow: OrderFlowApi<SqliteDatabase, FakeCheckoutGateway>,
    pub reconciler: PaymentReconciler<SqliteDatabase, FakeCheckoutGateway>,
    pub queries: OrderQueryApi<SqliteDatabase>,
}

impl StorefrontWorld {
    pub fn system(&self) -> &OrderManagementSystem {
        self.system.as_ref().expect("Storefront not initialised")
    }

    pub fn order_id(&self, label: &str) -> OrderId {
        self.orders.get(label).cloned().unwrap_or_else(|| panic!("No order labelled {label}"))
    }
}

impl OrderManagementSystem {
    pub async fn new() -> Self {
        let db = new_test_database().await;
        seed_storefront(&db).await;
        debug!("Created database: {}", db.url());
        let gateway = FakeCheckoutGateway::new();
        let producers = EventProducers::default();
        let flow = OrderFlowApi::new(db.clone(), gateway.clone(), PricingPolicy::default(), producers.clone());
        let reconciler = PaymentReconciler::new(db.clone(), gateway.clone(), producers);
        let queries = OrderQueryApi::new(db.clone());
        Self { db, gateway, flow, reconciler, queries }
    }

    pub fn db_url(&self) -> &str {
        self.db.url()
    }
}

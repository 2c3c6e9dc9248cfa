use order_engine::{
    events::EventProducers,
    test_utils::{
        fake_gateway::FakeCheckoutGateway,
        prepare_env::{drop_test_database, new_test_database},
        seed::seed_storefront,
    },
    OrderFlowApi,
    OrderQueryApi,
    PaymentReconciler,
    PricingPolicy,
    SqliteDatabase,
};

pub struct TestSystem {
    pub db: SqliteDatabase,
    pub gateway: FakeCheckoutGateway,
    pub flow: OrderFlowApi<SqliteDatabase, FakeCheckoutGateway>,
    pub reconciler: PaymentReconciler<SqliteDatabase, FakeCheckoutGateway>,
    pub queries: OrderQueryApi<SqliteDatabase>,
}

impl TestSystem {
    pub async fn new() -> Self {
        Self::with_producers(EventProducers::default()).await
    }

    pub async fn with_producers(producers: EventProducers) -> Self {
        let db = new_test_database().await;
        seed_storefront(&db).await;
        let gateway = FakeCheckoutGateway::new();
        let flow = OrderFlowApi::new(db.clone(), gateway.clone(), PricingPolicy::default(), producers.clone());
        let reconciler = PaymentReconciler::new(db.clone(), gateway.clone(), producers);
        let queries = OrderQueryApi::new(db.clone());
        Self { db, gateway, flow, reconciler, queries }
    }

    pub async fn tear_down(self) {
        let TestSystem { db, .. } = self;
        drop_test_database(db).await;
    }
}
